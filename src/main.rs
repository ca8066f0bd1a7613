fn setup_environment() {
    // A stray Python environment breaks the yt-dlp zipapp.
    std::env::remove_var("PYTHONHOME");
    std::env::remove_var("PYTHONPATH");
}

fn main() -> std::process::ExitCode {
    setup_environment();
    youtudown_lib::run()
}
