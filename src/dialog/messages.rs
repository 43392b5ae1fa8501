//! Reply texts.

use crate::config::SiteHours;
use crate::rating::subject::SubjectCatalog;

pub const GREETING: &str = "Привет! Я бот для мониторинга твоего рейтинга.\n\n\
    Нажми на кнопку «Начать» или введи команду с клавиатуры";
pub const CANCELLED: &str = "Действие отменено. Вы в главном меню.";
pub const MAIN_MENU: &str = "Выберите действие:";
pub const HINT: &str = "Нажмите «Начать», чтобы подключить уведомления о рейтинге.";
pub const CONNECTING: &str = "Подключение уведомлений... Ожидайте";
pub const CONNECTED: &str = "Уведомления успешно подключены";
pub const SESSION_EXPIRED: &str = "Сессия устарела. Пожалуйста, начните заново командой /start";
pub const LOADING: &str = "Загружаем данные с сайта... \nЭто займёт около 5 секунд";
pub const LOADED: &str = "Данные получены. Откройте изображение ниже";
pub const NOT_A_NUMBER: &str = "Введите целое число (цифрой, например: 2) или используйте кнопки";

pub fn enter_id(len: usize) -> String {
    format!("Введите номер вашей зачётной книжки (ровно {len} цифр):")
}

pub fn invalid_id(len: usize) -> String {
    format!("Номер зачётной книжки должен содержать ровно {len} цифр.\nПовторите ввод:")
}

pub fn out_of_range(count: usize) -> String {
    format!("Введите число от 1 до {count}")
}

pub fn site_unavailable(hours: &SiteHours) -> String {
    format!(
        "Сайт рейтинга недоступен с {:02}:00 до {:02}:00.\nПопробуйте запросить данные днём.",
        hours.unavailable_from, hours.unavailable_until
    )
}

pub fn student_not_found(student_id: &str, subject: &str) -> String {
    format!("Студент {student_id} не найден в таблице по предмету '{subject}'.")
}

pub fn rating_caption(subject: &str) -> String {
    format!("Рейтинг по предмету: {}", subject.to_lowercase())
}

pub fn subject_menu(subjects: &SubjectCatalog) -> String {
    let mut text = String::from("Введите номер предмета:\n\n");
    for (i, subject) in subjects.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, subject.name));
    }
    text.push_str(&format!("\nВсего предметов: {}", subjects.len()));
    text
}
