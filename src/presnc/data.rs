use super::{Property, Site};
use crate::{utils, CrawlerError, Storage, Table};
use futures::TryStreamExt;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteRow},
    Row, SqlitePool,
};
use tracing::{debug, warn};

pub struct PropertyTable {
    name: String,
    pool: SqlitePool,
}

#[async_trait::async_trait]
impl Table for PropertyTable {
    type Record<'a> = &'a Property;

    fn get_name(&self) -> &str {
        self.name.as_str()
    }

    fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create(&self) -> Result<(), sqlx::Error> {
        if !utils::is_table_exists(self.get_pool(), &self.name).await? {
            let query = format!(
                r#"
                        CREATE TABLE {} (
                            id TEXT PRIMARY KEY,
                            created_at DATETIME,
                            name TEXT,
                            description TEXT,
                            price REAL,
                            address TEXT,
                            city TEXT,
                            county TEXT,
                            state TEXT,
                            zip TEXT,
                            longitude REAL,
                            latitude REAL
                        )
                    "#,
                &self.name
            );
            sqlx::query(query.as_str()).execute(self.get_pool()).await?;
        }
        Ok(())
    }

    /// Replaces any stored row with the same id, so crawling twice does not
    /// duplicate properties.
    async fn insert<'a>(&self, record: Self::Record<'a>) -> Result<(), sqlx::Error> {
        let mut tx = self.get_pool().begin().await?;
        let query = format!(
            r#"INSERT OR REPLACE INTO {} (
                id,
                name,
                description,
                price,
                address,
                city,
                county,
                state,
                zip,
                longitude,
                latitude,
                created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            self.name
        );
        sqlx::query(&query)
            .bind(record.id.as_str())
            .bind(record.name.as_str())
            .bind(record.description.as_str())
            .bind(record.price)
            .bind(record.location.address.as_str())
            .bind(record.location.city.as_str())
            .bind(record.location.county.as_str())
            .bind(record.location.state.as_str())
            .bind(record.location.postal_code.as_str())
            .bind(record.location.longitude)
            .bind(record.location.latitude)
            .bind(utils::get_now())
            .execute(&mut tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

fn property_from_row(row: &SqliteRow) -> Result<Property, sqlx::Error> {
    Ok(Property {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: row.try_get("price")?,
        location: Site {
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            county: row.try_get("county")?,
            state: row.try_get("state")?,
            postal_code: row.try_get("zip")?,
            longitude: row.try_get("longitude")?,
            latitude: row.try_get("latitude")?,
        },
    })
}

pub struct PresncData {
    pub name: String,
    pub properties: PropertyTable,
    pool: SqlitePool,
}

impl PresncData {
    pub async fn new(name: &str) -> Result<PresncData, CrawlerError> {
        let opt = SqliteConnectOptions::new()
            .filename(format!("{}.db", name))
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt).await?;
        let p = PresncData {
            name: name.to_string(),
            properties: PropertyTable {
                name: format!("{}_properties", name),
                pool: pool.clone(),
            },
            pool,
        };

        if !utils::is_table_exists(&p.pool, &p.properties.name).await? {
            debug!("Create table {}", p.properties.name);
            p.properties.create().await?;
        } else {
            debug!("Use table {}", p.properties.name);
        }

        Ok(p)
    }
}

#[async_trait::async_trait]
impl Storage for PresncData {
    type Record = Property;

    async fn save(&self, records: &[Property]) -> Result<usize, CrawlerError> {
        let mut saved = 0;
        for prop in records {
            match self.properties.insert(prop).await {
                Ok(()) => saved += 1,
                Err(e) => warn!(
                    "Failed to store property {} ({}): {}",
                    prop.id, prop.name, e
                ),
            }
        }
        Ok(saved)
    }

    async fn load(&self) -> Result<Vec<Property>, CrawlerError> {
        let mut props = vec![];
        let query = format!("SELECT * FROM {} ORDER BY rowid", self.properties.get_name());
        let mut rows = sqlx::query(&query).fetch(&self.pool);
        while let Some(row) = rows.try_next().await? {
            props.push(property_from_row(&row)?);
        }
        Ok(props)
    }

    async fn clear(&self) -> Result<u64, CrawlerError> {
        Ok(self.properties.delete_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tokio::fs;

    fn property(id: &str, name: &str, price: Option<f64>) -> Property {
        Property {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            price,
            location: Site {
                address: "400 Pollock Street".to_string(),
                city: "Beaufort".to_string(),
                county: "Carteret County".to_string(),
                state: "NC".to_string(),
                postal_code: "28516".to_string(),
                longitude: None,
                latitude: None,
            },
        }
    }

    async fn fresh(name: &str) -> PresncData {
        let file = format!("{}.db", name);
        if Path::new(&file).is_file() {
            fs::remove_file(&file).await.unwrap();
        }
        PresncData::new(name).await.unwrap()
    }

    #[tokio::test]
    async fn create_new_file() {
        let p = fresh("presnc_test1").await;
        assert!(Path::new("presnc_test1.db").is_file());
        assert_eq!(p.properties.get_name(), "presnc_test1_properties");
        assert_eq!(p.properties.count().await.unwrap(), 0);

        fs::remove_file("presnc_test1.db").await.unwrap();
    }

    #[tokio::test]
    async fn insert_count_and_delete_rows() {
        let p = fresh("presnc_test2").await;

        p.properties
            .insert(&property("1093", "Godette Hotel", Some(250000.0)))
            .await
            .unwrap();
        p.properties
            .insert(&property("877", "Bellamy House", None))
            .await
            .unwrap();
        assert_eq!(p.properties.count().await.unwrap(), 2);

        assert_eq!(p.properties.delete_all().await.unwrap(), 2);
        assert_eq!(p.properties.count().await.unwrap(), 0);
        assert_eq!(p.properties.delete_all().await.unwrap(), 0);

        fs::remove_file("presnc_test2.db").await.unwrap();
    }

    #[tokio::test]
    async fn save_load_and_clear() {
        let p = fresh("presnc_test3").await;

        let props = vec![
            property("5", "Five", Some(5.0)),
            property("9", "Nine", None),
            property("1", "One", Some(1234567.0)),
        ];
        assert_eq!(p.save(&props).await.unwrap(), 3);
        assert_eq!(p.load().await.unwrap(), props);

        assert_eq!(p.clear().await.unwrap(), 3);
        assert!(p.load().await.unwrap().is_empty());

        fs::remove_file("presnc_test3.db").await.unwrap();
    }

    #[tokio::test]
    async fn saving_again_replaces_rows() {
        let p = fresh("presnc_test4").await;

        p.save(&[property("1093", "Godette Hotel", None)])
            .await
            .unwrap();
        p.save(&[property("1093", "Godette Hotel", Some(250000.0))])
            .await
            .unwrap();

        assert_eq!(p.properties.count().await.unwrap(), 1);
        assert_eq!(p.load().await.unwrap()[0].price, Some(250000.0));

        fs::remove_file("presnc_test4.db").await.unwrap();
    }
}
