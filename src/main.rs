use std::process::ExitCode;

fn main() -> ExitCode {
    vinscan_lib::run()
}
