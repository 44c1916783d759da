fn main() {
    if let Err(err) = agriguard_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
