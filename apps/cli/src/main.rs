fn main() {
    if let Err(err) = camdir_lib::run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
