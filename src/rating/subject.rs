//! The fixed catalog of monitored subjects.

/// A subject and its identifier on the rating site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub reference: String,
}

impl Subject {
    pub fn new(name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reference: reference.into(),
        }
    }
}

/// Ordered list of subjects. Users pick them by 1-based position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectCatalog {
    subjects: Vec<Subject>,
}

impl SubjectCatalog {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Self { subjects }
    }

    /// Looks up a subject by its 1-based menu position.
    pub fn get(&self, position: usize) -> Option<&Subject> {
        position
            .checked_sub(1)
            .and_then(|index| self.subjects.get(index))
    }

    pub fn find(&self, name: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.subjects.iter().map(|s| s.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.iter()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl Default for SubjectCatalog {
    fn default() -> Self {
        Self::new(vec![
            Subject::new("Администрирование отеля", "251282"),
            Subject::new("Иностранный язык (второй)", "251287"),
            Subject::new("Организация и контроль в туристской деятельности", "251290"),
            Subject::new("Организация и технологии санаторно-курортного дела", "251291"),
            Subject::new("Основы классификации гостиничных предприятий", "251292"),
            Subject::new(
                "Основы производственно-технологической деятельности гостиниц",
                "251293",
            ),
            Subject::new("Специальные виды туризма", "251296"),
            Subject::new("Туристское ресурсоведение", "251297"),
            Subject::new("Экономика организаций профессиональной сферы", "251299"),
        ])
    }
}
