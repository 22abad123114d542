#[macroquad::main("Tileforge")]
async fn main() {
    tileforge_web_lib::run().await;
}
