//! herd-reprice - Rewrite scheduled sale values from a price table.

fn main() -> std::process::ExitCode {
    herdbook::cmd::reprice::main()
}
