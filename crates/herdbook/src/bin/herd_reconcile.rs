//! herd-reconcile - Create the missing entrada for unpaired transfers.

fn main() -> std::process::ExitCode {
    herdbook::cmd::reconcile::main()
}
