use miette::Report;
use sgf_core::parser::Parser;
use std::fs;

#[test]
fn test_all_sgf_files() {
    let tests_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/ok");
    let entries = fs::read_dir(tests_dir).expect("Failed to read tests directory");

    let mut parsed = 0;
    for entry in entries {
        let entry = entry.expect("Failed to read directory entry");
        let path = entry.path();

        if path.is_file() && path.extension().is_some_and(|ext| ext == "sgf") {
            println!("Parsing file: {:?}", path);
            let source =
                fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to read file: {:?}", path));

            let parser = Parser::new_with_name(&source, path.to_string_lossy().to_string())
                .unwrap_or_else(|err| panic!("Failed to lex {:?}. Error: {:?}", path, Report::new(err)));

            match parser.parse_collection() {
                Ok(collection) => assert!(collection.is_valid(), "{:?} parsed but is not valid", path),
                Err(err) => panic!("Failed to parse {:?}. Error: {:?}", path, Report::new(err)),
            }
            parsed += 1;
        }
    }
    assert!(parsed > 0, "no fixtures found in {tests_dir}");
}
