fn main() -> anyhow::Result<()> {
    ratchaview::cli::run()
}
