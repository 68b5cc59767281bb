use sgf_core::{parse, SgfFormat};

fn main() {
    let sgf_data = "(;FF[4]GM[1]SZ[19];B[qd];W[dc](;B[pp])(;B[dp]C[the other corner]))";

    match parse(sgf_data) {
        Ok(mut collection) => {
            let tree = &mut collection.trees_mut()[0];
            tree.swap_children_at(0, 1);
            println!("{}", collection.to_sgf(&SgfFormat::DEFAULT));
            println!("{}", sgf_core::to_json(&collection).unwrap_or_default());
        }
        Err(e) => {
            eprintln!("Failed to parse SGF: {:?}", miette::Report::new(e));
        }
    }
}
