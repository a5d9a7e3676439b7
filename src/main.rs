fn main() {
    pulse_lib::run()
}
