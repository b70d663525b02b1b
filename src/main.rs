fn main() -> Result<(), Box<dyn std::error::Error>> {
    mic_recorder::ui::run()
}
