//! herd-spread - Split an annual amount into jittered periodic values.

fn main() -> std::process::ExitCode {
    herdbook::cmd::spread::main()
}
