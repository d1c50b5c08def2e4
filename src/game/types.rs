use super::snake::Snake;
use tokio::sync::mpsc;

#[derive(Debug)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub snake: Snake,
    pub ready: bool,
    pub sender: mpsc::Sender<String>,
}
