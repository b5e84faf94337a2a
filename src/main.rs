fn main() -> std::process::ExitCode {
    medcipher_lib::run()
}
