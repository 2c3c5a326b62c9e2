//! Stand-alone archiver. Writes `MetaFilesCompressed.zip` next to this
//! executable unless `--root` or `METAPACK_ROOT` says otherwise.

fn main() -> std::process::ExitCode {
    metapack::cli_runner::run_compress_app()
}
