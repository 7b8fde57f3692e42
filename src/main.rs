fn main() {
    if let Err(err) = cfg_grid_layout::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
