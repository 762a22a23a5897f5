fn main() {
    aligner_lib::run()
}
