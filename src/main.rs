use champion_assistant::ui::render;

fn main() {
    if let Err(err) = champion_assistant::run() {
        match champion_assistant::validation_error(&err) {
            Some(invalid) => eprint!("{}", render::field_errors(invalid.errors())),
            None => eprintln!("error: {err:#}"),
        }
        std::process::exit(champion_assistant::exit_code(&err));
    }
}
