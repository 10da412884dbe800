fn main() {
    if let Err(e) = opfa::app::run_cli() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
