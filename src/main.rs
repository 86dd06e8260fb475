fn main() {
    if let Err(err) = populate_gen::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
