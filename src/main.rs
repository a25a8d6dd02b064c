fn main() {
    if let Err(err) = celestial_figures::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
