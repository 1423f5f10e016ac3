//! herd-chain - Run a periodic transfer chain to a horizon year.

fn main() -> std::process::ExitCode {
    herdbook::cmd::chain::main()
}
