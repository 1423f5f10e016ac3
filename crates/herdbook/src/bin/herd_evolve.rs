//! herd-evolve - Schedule a category promotion for a cohort.

fn main() -> std::process::ExitCode {
    herdbook::cmd::evolve::main()
}
