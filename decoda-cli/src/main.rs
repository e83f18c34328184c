fn main() {
    if let Err(err) = decoda_cli::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
