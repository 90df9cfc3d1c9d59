fn main() -> anyhow::Result<()> {
    rosefiles::cli::run_cli()
}
