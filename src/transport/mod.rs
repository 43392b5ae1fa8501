//! Outbound chat messages.

pub mod discord;
pub mod error;
pub mod notifier;

use async_trait::async_trait;

use crate::store::UserId;
use crate::transport::error::TransportError;

/// Reply options offered to the user along with a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keyboard {
    /// No options; any previous keyboard is hidden.
    None,
    /// A single "begin" option.
    Start,
    /// "Enter record-book number" and "cancel".
    MainMenu,
    /// Only "cancel".
    Cancel,
    /// Subject numbers `1..=count`, then "cancel".
    Subjects(usize),
    /// "Another subject" and "cancel".
    SubjectActions,
}

impl Keyboard {
    /// Button rows, top to bottom.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let row = |labels: &[&str]| labels.iter().map(|l| l.to_string()).collect::<Vec<_>>();
        match self {
            Keyboard::None => Vec::new(),
            Keyboard::Start => vec![row(&[labels::BEGIN])],
            Keyboard::MainMenu => vec![row(&[labels::ENTER_ID]), row(&[labels::CANCEL])],
            Keyboard::Cancel => vec![row(&[labels::CANCEL])],
            Keyboard::Subjects(count) => {
                let numbers: Vec<String> = (1..=*count).map(|i| i.to_string()).collect();
                let mut rows: Vec<Vec<String>> =
                    numbers.chunks(3).map(|chunk| chunk.to_vec()).collect();
                rows.push(row(&[labels::CANCEL]));
                rows
            }
            Keyboard::SubjectActions => vec![row(&[labels::ANOTHER_SUBJECT, labels::CANCEL])],
        }
    }
}

/// Button captions. They double as the command words the dialog recognizes.
pub mod labels {
    pub const BEGIN: &str = "Начать";
    pub const ENTER_ID: &str = "Ввести номер зачётной книжки";
    pub const CANCEL: &str = "Отмена";
    pub const ANOTHER_SUBJECT: &str = "Выбрать другой предмет";
}

/// Delivers messages to a user of the chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_text(
        &self,
        user: UserId,
        text: &str,
        keyboard: &Keyboard,
    ) -> Result<(), TransportError>;

    async fn send_image(
        &self,
        user: UserId,
        png: Vec<u8>,
        caption: &str,
    ) -> Result<(), TransportError>;
}
