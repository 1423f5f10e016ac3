//! herd-check - Report transfer saídas with no matching entrada.

fn main() -> std::process::ExitCode {
    herdbook::cmd::check::main()
}
