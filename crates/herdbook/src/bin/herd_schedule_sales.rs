//! herd-schedule-sales - Rebuild the monthly sale program for a plan.

fn main() -> std::process::ExitCode {
    herdbook::cmd::schedule_sales::main()
}
