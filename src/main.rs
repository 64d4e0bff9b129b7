fn main() -> anyhow::Result<()> {
    brrtmux::cli::run_cli()
}
