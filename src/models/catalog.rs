use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    pub duration_minutes: u32,
    #[serde(default)]
    pub category: String,
}

/// Services offered by the salon. Owned by configuration, not by the booking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub services: Vec<Service>,
}

impl Catalog {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let catalog: Catalog = serde_json::from_str(s)?;
        let mut seen = HashSet::new();
        for service in &catalog.services {
            if !seen.insert(service.id) {
                anyhow::bail!("duplicate service id: {}", service.id);
            }
            if service.name.trim().is_empty() {
                anyhow::bail!("service {} has no name", service.id);
            }
            if service.price_cents < 0 {
                anyhow::bail!("service {} has a negative price", service.id);
            }
            if service.duration_minutes == 0 {
                anyhow::bail!("service {} has no duration", service.id);
            }
        }
        Ok(catalog)
    }

    pub fn find(&self, id: u32) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn salon_default() -> Self {
        let service = |id, name: &str, description: &str, price_cents, duration_minutes, category: &str| Service {
            id,
            name: name.to_string(),
            description: description.to_string(),
            price_cents,
            duration_minutes,
            category: category.to_string(),
        };

        Catalog {
            services: vec![
                service(1, "Manicure Clássica", "Cuidado completo das unhas das mãos", 2500, 45, "manicure"),
                service(2, "Pedicure Spa", "Tratamento relaxante para os pés", 3500, 60, "pedicure"),
                service(3, "Manicure + Pedicure", "Pacote completo com desconto especial", 5000, 90, "combo"),
                service(4, "Unha Decorada", "Arte personalizada nas unhas", 1500, 30, "decoracao"),
                service(5, "Alongamento", "Alongamento de unhas profissional", 4500, 90, "alongamento"),
                service(6, "Spa dos Pés Completo", "Hidratação e esfoliação profunda", 5500, 75, "spa"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_json() {
        let json = r#"{"services":[{"id":1,"name":"Manicure","price_cents":2500,"duration_minutes":45}]}"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.services.len(), 1);
        assert_eq!(catalog.find(1).map(|s| s.price_cents), Some(2500));
        assert!(catalog.find(2).is_none());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(Catalog::from_json("not json").is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let json = r#"{"services":[
            {"id":1,"name":"A","price_cents":100,"duration_minutes":30},
            {"id":1,"name":"B","price_cents":200,"duration_minutes":30}
        ]}"#;
        assert!(Catalog::from_json(json).is_err());
    }

    #[test]
    fn test_negative_price_rejected() {
        let json = r#"{"services":[{"id":1,"name":"A","price_cents":-1,"duration_minutes":30}]}"#;
        assert!(Catalog::from_json(json).is_err());
    }

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = Catalog::salon_default();
        let json = serde_json::to_string(&catalog).unwrap();
        let parsed = Catalog::from_json(&json).unwrap();
        assert_eq!(parsed.services.len(), 6);
        assert_eq!(parsed.find(1).map(|s| s.price_cents), Some(2500));
    }
}
