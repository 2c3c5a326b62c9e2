//! Main entry point for the metapack CLI app

fn main() -> std::process::ExitCode {
    metapack::cli_runner::run_cli_app()
}
