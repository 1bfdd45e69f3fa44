use std::process::ExitCode;

mod app;
mod world;

fn main() -> ExitCode {
    let app = app::bootstrap::build_app();
    app::loop_runner::run(app)
}
