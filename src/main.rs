mod cmdline;

fn main() {
    cmdline::run();
}
