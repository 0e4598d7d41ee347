fn main() {
    std::process::exit(tabcast_cli::run_with_args(std::env::args_os()));
}
