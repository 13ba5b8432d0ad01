use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Pizza,
    Burgers,
    Sandwiches,
    Sides,
    Salads,
    Drinks,
    Desserts,
    Meals,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Pizza,
        Category::Burgers,
        Category::Sandwiches,
        Category::Sides,
        Category::Salads,
        Category::Drinks,
        Category::Desserts,
        Category::Meals,
    ];

    pub fn from_code(code: &str) -> Self {
        match code {
            "pizza" => Category::Pizza,
            "burgers" => Category::Burgers,
            "sandwiches" => Category::Sandwiches,
            "sides" => Category::Sides,
            "salads" => Category::Salads,
            "drinks" => Category::Drinks,
            "desserts" => Category::Desserts,
            "meals" => Category::Meals,
            _ => Category::Unknown,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Category::Pizza => "pizza",
            Category::Burgers => "burgers",
            Category::Sandwiches => "sandwiches",
            Category::Sides => "sides",
            Category::Salads => "salads",
            Category::Drinks => "drinks",
            Category::Desserts => "desserts",
            Category::Meals => "meals",
            Category::Unknown => "unknown",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Pizza => "Pizza",
            Category::Burgers => "Burgers",
            Category::Sandwiches => "Sandwiches",
            Category::Sides => "Sides",
            Category::Salads => "Salads",
            Category::Drinks => "Drinks",
            Category::Desserts => "Desserts",
            Category::Meals => "Family Meals",
            Category::Unknown => "Other",
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Category::from_code(&code))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub cost: f64,
    pub details: String,
    pub images: Vec<String>,
    pub quantity: u32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}
