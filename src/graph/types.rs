use std::fmt;

use serde::{Deserialize, Serialize};

use crate::date::{resolve_offset, DateValue};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }
    };
}

entity_id!(
    /// Stable person identifier
    PersonId
);
entity_id!(
    /// Stable union identifier
    UnionId
);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unset,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Birth,
    Baptism,
    Christening,
    Death,
    Burial,
    Marriage,
    Residence,
    Occupation,
    Immigration,
    Emigration,
    Census,
    Military,
    Education,
    #[default]
    Other,
}

/// Which of the person's own dates a relative event date counts from.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateAnchor {
    Birth,
    Death,
}

/// "+4d from birth"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeDate {
    pub offset: String,
    pub anchor: DateAnchor,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LifeEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub description: String,
    pub date: DateValue,
    pub place: String,
    pub sources: Vec<String>,
    /// When set, `date` is derived from the anchor date
    pub relative: Option<RelativeDate>,
}

impl LifeEvent {
    /// The event's date, resolving a relative offset against `person`.
    pub fn resolved_date(&self, person: &Person) -> DateValue {
        match &self.relative {
            Some(rel) => {
                let base = match rel.anchor {
                    DateAnchor::Birth => &person.birth_date,
                    DateAnchor::Death => &person.death_date,
                };
                resolve_offset(&rel.offset, base)
            }
            None => self.date.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    pub given_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub maiden_name: String,
    pub nick_name: String,
    pub title: String,
    pub gender: Gender,
    pub birth_date: DateValue,
    pub death_date: DateValue,
    pub birth_place: String,
    pub death_place: String,
    pub notes: String,
    pub events: Vec<LifeEvent>,
}

impl Person {
    pub fn new(id: impl Into<PersonId>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    /// "Title Given Middle Last", skipping blanks. Falls back to the
    /// nickname, then to "Unnamed".
    pub fn display_name(&self) -> String {
        let full = [&self.title, &self.given_name, &self.middle_name, &self.last_name]
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            full
        } else if !self.nick_name.trim().is_empty() {
            self.nick_name.trim().to_string()
        } else {
            "Unnamed".to_string()
        }
    }

    /// "1850 – 1910"; empty when neither date says anything.
    pub fn lifespan(&self) -> String {
        let birth = self.birth_date.display();
        let death = self.death_date.display();
        match (birth.is_empty(), death.is_empty()) {
            (true, true) => String::new(),
            (false, true) => format!("b. {}", birth),
            (true, false) => format!("d. {}", death),
            (false, false) => format!("{} – {}", birth, death),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnionKind {
    #[default]
    Marriage,
    CivilUnion,
    CommonLaw,
    Partnership,
}

impl UnionKind {
    pub fn label(self) -> &'static str {
        match self {
            UnionKind::Marriage => "Marriage",
            UnionKind::CivilUnion => "Civil union",
            UnionKind::CommonLaw => "Common law",
            UnionKind::Partnership => "Partnership",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Divorce,
    Separation,
    Annulment,
    Death,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Union {
    pub id: UnionId,
    pub partner1_id: Option<PersonId>,
    pub partner2_id: Option<PersonId>,
    #[serde(rename = "type")]
    pub kind: UnionKind,
    pub start_date: DateValue,
    pub end_date: DateValue,
    pub start_place: String,
    pub end_reason: Option<EndReason>,
    /// Ordered; birth order as the user entered it
    pub child_ids: Vec<PersonId>,
    pub sources: Vec<String>,
}

impl Union {
    pub fn new(id: impl Into<UnionId>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    pub fn has_partner(&self, person: &PersonId) -> bool {
        self.partner1_id.as_ref() == Some(person) || self.partner2_id.as_ref() == Some(person)
    }

    pub fn has_child(&self, person: &PersonId) -> bool {
        self.child_ids.contains(person)
    }

    /// Present partner ids, partner1 first.
    pub fn partners(&self) -> impl Iterator<Item = &PersonId> {
        self.partner1_id.iter().chain(self.partner2_id.iter())
    }

    /// "Marriage 1875" style label for the union marker.
    pub fn label(&self) -> String {
        let date = self.start_date.display();
        if date.is_empty() {
            self.kind.label().to_string()
        } else {
            format!("{} {}", self.kind.label(), date)
        }
    }
}

/// The relational family graph: flat collections keyed by id.
///
/// Collection order is meaningful (it is the iteration order every resolver
/// and layout uses) and preserved by all edits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyGraph {
    pub people: Vec<Person>,
    pub unions: Vec<Union>,
}

impl FamilyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn person(&self, id: &PersonId) -> Option<&Person> {
        self.people.iter().find(|p| &p.id == id)
    }

    pub fn union(&self, id: &UnionId) -> Option<&Union> {
        self.unions.iter().find(|u| &u.id == id)
    }

    pub fn contains_person(&self, id: &PersonId) -> bool {
        self.person(id).is_some()
    }

    /// True if any person or union already uses `id`.
    pub fn id_in_use(&self, id: &str) -> bool {
        self.people.iter().any(|p| p.id.as_str() == id) || self.unions.iter().any(|u| u.id.as_str() == id)
    }

    pub(crate) fn person_mut(&mut self, id: &PersonId) -> Option<&mut Person> {
        self.people.iter_mut().find(|p| &p.id == id)
    }

    pub(crate) fn union_mut(&mut self, id: &UnionId) -> Option<&mut Union> {
        self.unions.iter_mut().find(|u| &u.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::parse_date_string;

    #[test]
    fn test_display_name() {
        let mut p = Person::new("p1");
        assert_eq!(p.display_name(), "Unnamed");
        p.nick_name = "Bert".into();
        assert_eq!(p.display_name(), "Bert");
        p.given_name = "Albert".into();
        p.last_name = "Ross".into();
        p.title = "Dr.".into();
        assert_eq!(p.display_name(), "Dr. Albert Ross");
    }

    #[test]
    fn test_lifespan() {
        let mut p = Person::new("p1");
        assert_eq!(p.lifespan(), "");
        p.birth_date = parse_date_string("1850");
        assert_eq!(p.lifespan(), "b. 1850");
        p.death_date = parse_date_string("c. 1910");
        assert_eq!(p.lifespan(), "1850 – c. 1910");
    }

    #[test]
    fn test_relative_event_date() {
        let mut p = Person::new("p1");
        p.birth_date = parse_date_string("1 Jan 1900");
        let baptism = LifeEvent {
            kind: EventKind::Baptism,
            relative: Some(RelativeDate { offset: "+4d".into(), anchor: DateAnchor::Birth }),
            ..Default::default()
        };
        assert_eq!(baptism.resolved_date(&p), DateValue::exact(1900, Some(1), Some(5)));

        let burial = LifeEvent {
            kind: EventKind::Burial,
            relative: Some(RelativeDate { offset: "+3d".into(), anchor: DateAnchor::Death }),
            ..Default::default()
        };
        assert!(burial.resolved_date(&p).is_unknown());
    }

    #[test]
    fn test_union_partners() {
        let mut u = Union::new("u1");
        u.partner2_id = Some("b".into());
        assert_eq!(u.partners().cloned().collect::<Vec<_>>(), vec![PersonId::from("b")]);
        assert!(u.has_partner(&"b".into()));
        assert!(!u.has_partner(&"a".into()));
    }

    #[test]
    fn test_graph_json_shape() {
        let mut g = FamilyGraph::new();
        g.people.push(Person::new("a"));
        let mut u = Union::new("u1");
        u.partner1_id = Some("a".into());
        u.child_ids.push("c".into());
        g.unions.push(u);

        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["unions"][0]["partner1Id"], "a");
        assert_eq!(json["unions"][0]["partner2Id"], serde_json::Value::Null);
        assert_eq!(json["unions"][0]["childIds"][0], "c");
        assert_eq!(json["unions"][0]["type"], "marriage");
        assert_eq!(json["people"][0]["birthDate"]["type"], "unknown");

        let back: FamilyGraph = serde_json::from_value(json).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn test_partial_json_loads_with_defaults() {
        let g: FamilyGraph = serde_json::from_str(r#"{"people": [{"id": "a", "givenName": "Ann"}]}"#).unwrap();
        assert_eq!(g.people[0].given_name, "Ann");
        assert_eq!(g.people[0].gender, Gender::Unset);
        assert!(g.people[0].birth_date.is_unknown());
        assert!(g.unions.is_empty());
    }
}
