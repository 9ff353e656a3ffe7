fn main() -> anyhow::Result<()> {
    focuslog_lib::run()
}
