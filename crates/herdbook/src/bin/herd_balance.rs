//! herd-balance - Replayed head count for a herd on a date.

fn main() -> std::process::ExitCode {
    herdbook::cmd::balance::main()
}
