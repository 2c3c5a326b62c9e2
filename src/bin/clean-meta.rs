//! Stand-alone cleaner. Deletes every `.meta` file below the directory that
//! contains this executable unless `--root` or `METAPACK_ROOT` says otherwise.

fn main() -> std::process::ExitCode {
    metapack::cli_runner::run_clean_app()
}
