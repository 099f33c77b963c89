fn main() {
    tennis_scoreboard_lib::run()
}
