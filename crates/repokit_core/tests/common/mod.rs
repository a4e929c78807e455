#![allow(dead_code)]

use repokit_core::{
    open_db_in_memory, Entity, Migration, Record, Relation, RelationKind, RepoResult,
    SoftDeletable, TableSchema,
};
use rusqlite::Connection;

pub const FIXTURE_SCHEMA: &str = "
CREATE TABLE users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    score INTEGER,
    price REAL,
    created_at TEXT,
    updated_at TEXT,
    deleted_at TEXT
);
CREATE TABLE profiles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    city TEXT NOT NULL
);
CREATE TABLE categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    name TEXT NOT NULL
);
CREATE TABLE products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price REAL NOT NULL
);
CREATE TABLE orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    product_id INTEGER NOT NULL REFERENCES products(id),
    total REAL NOT NULL,
    created_at TEXT NOT NULL,
    deleted_at TEXT
);
CREATE TABLE bans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    reason TEXT NOT NULL
);
";

pub const MIGRATIONS: &[Migration] = &[Migration::new(1, FIXTURE_SCHEMA)];

pub static CATEGORIES: TableSchema = TableSchema {
    entity: "Category",
    table: "categories",
    primary_key: "id",
    columns: &["id", "profile_id", "name"],
    relations: &[],
    soft_delete_column: None,
    timestamps: false,
};

pub static PROFILES: TableSchema = TableSchema {
    entity: "Profile",
    table: "profiles",
    primary_key: "id",
    columns: &["id", "user_id", "city"],
    relations: &[Relation {
        name: "categories",
        kind: RelationKind::HasMany,
        target: &CATEGORIES,
        local_key: "id",
        foreign_key: "profile_id",
    }],
    soft_delete_column: None,
    timestamps: false,
};

pub static PRODUCTS: TableSchema = TableSchema {
    entity: "Product",
    table: "products",
    primary_key: "id",
    columns: &["id", "name", "price"],
    relations: &[],
    soft_delete_column: None,
    timestamps: false,
};

pub static ORDERS: TableSchema = TableSchema {
    entity: "Order",
    table: "orders",
    primary_key: "id",
    columns: &["id", "user_id", "product_id", "total", "created_at", "deleted_at"],
    relations: &[Relation {
        name: "product",
        kind: RelationKind::BelongsTo,
        target: &PRODUCTS,
        local_key: "product_id",
        foreign_key: "id",
    }],
    soft_delete_column: Some("deleted_at"),
    timestamps: false,
};

pub static BANS: TableSchema = TableSchema {
    entity: "Ban",
    table: "bans",
    primary_key: "id",
    columns: &["id", "user_id", "reason"],
    relations: &[],
    soft_delete_column: None,
    timestamps: false,
};

pub static USERS: TableSchema = TableSchema {
    entity: "User",
    table: "users",
    primary_key: "id",
    columns: &[
        "id",
        "name",
        "status",
        "score",
        "price",
        "created_at",
        "updated_at",
        "deleted_at",
    ],
    relations: &[
        Relation {
            name: "profile",
            kind: RelationKind::HasOne,
            target: &PROFILES,
            local_key: "id",
            foreign_key: "user_id",
        },
        Relation {
            name: "orders",
            kind: RelationKind::HasMany,
            target: &ORDERS,
            local_key: "id",
            foreign_key: "user_id",
        },
        Relation {
            name: "bans",
            kind: RelationKind::HasMany,
            target: &BANS,
            local_key: "id",
            foreign_key: "user_id",
        },
    ],
    soft_delete_column: Some("deleted_at"),
    timestamps: true,
};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub status: Option<String>,
    pub score: Option<i64>,
    pub price: Option<f64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub deleted_at: Option<String>,
    pub profile: Option<Profile>,
    pub orders: Vec<Order>,
}

impl Entity for User {
    fn schema() -> &'static TableSchema {
        &USERS
    }

    fn from_record(record: &Record) -> RepoResult<Self> {
        Ok(Self {
            id: record.get("id")?,
            name: record.get_opt("name")?,
            status: record.get_opt("status")?,
            score: record.get_opt("score")?,
            price: record.get_opt("price")?,
            created_at: record.get_opt("created_at")?,
            updated_at: record.get_opt("updated_at")?,
            deleted_at: record.get_opt("deleted_at")?,
            profile: record
                .related_one("profile")
                .map(Profile::from_record)
                .transpose()?,
            orders: record
                .related("orders")
                .iter()
                .map(Order::from_record)
                .collect::<RepoResult<_>>()?,
        })
    }
}

impl SoftDeletable for User {}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub city: String,
    pub categories: Vec<Category>,
}

impl Entity for Profile {
    fn schema() -> &'static TableSchema {
        &PROFILES
    }

    fn from_record(record: &Record) -> RepoResult<Self> {
        Ok(Self {
            id: record.get("id")?,
            user_id: record.get("user_id")?,
            city: record.get("city")?,
            categories: record
                .related("categories")
                .iter()
                .map(Category::from_record)
                .collect::<RepoResult<_>>()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub profile_id: i64,
    pub name: String,
}

impl Entity for Category {
    fn schema() -> &'static TableSchema {
        &CATEGORIES
    }

    fn from_record(record: &Record) -> RepoResult<Self> {
        Ok(Self {
            id: record.get("id")?,
            profile_id: record.get("profile_id")?,
            name: record.get("name")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub total: f64,
    pub product_name: Option<String>,
}

impl Entity for Order {
    fn schema() -> &'static TableSchema {
        &ORDERS
    }

    fn from_record(record: &Record) -> RepoResult<Self> {
        let product_name = match record.related_one("product") {
            Some(product) => Some(product.get("name")?),
            None => None,
        };
        Ok(Self {
            id: record.get("id")?,
            user_id: record.get("user_id")?,
            total: record.get("total")?,
            product_name,
        })
    }
}

impl SoftDeletable for Order {}

/// Marked soft-deletable although `bans` has no archive column.
#[derive(Debug, Clone, PartialEq)]
pub struct Ban {
    pub id: i64,
    pub reason: String,
}

impl Entity for Ban {
    fn schema() -> &'static TableSchema {
        &BANS
    }

    fn from_record(record: &Record) -> RepoResult<Self> {
        Ok(Self {
            id: record.get("id")?,
            reason: record.get("reason")?,
        })
    }
}

impl SoftDeletable for Ban {}

const SEED: &str = "
INSERT INTO users (id, name, status, score, price, created_at, deleted_at) VALUES
    (1, 'Furkan Yilmaz', 'active', 90, 150, '2025-06-01 09:00:00', NULL),
    (2, 'Ayse Demir', 'active', 50, 80, '2025-06-02 09:00:00', NULL),
    (3, 'Mehmet Kaya', 'inactive', 49, 300, '2025-06-03 09:00:00', NULL),
    (4, 'Elif Sahin', 'active', 91, 120, '2025-06-04 09:00:00', NULL),
    (5, 'Ali Archived', 'active', 70, 200, '2025-06-05 09:00:00', '2025-07-01 00:00:00');
INSERT INTO profiles (id, user_id, city) VALUES
    (1, 1, 'Elazig'),
    (2, 2, 'Istanbul'),
    (3, 3, 'Elazig');
INSERT INTO categories (id, profile_id, name) VALUES
    (1, 1, 'books'),
    (2, 1, 'travel'),
    (3, 2, 'music');
INSERT INTO products (id, name, price) VALUES
    (1, 'Laptop', 1500),
    (2, 'Mouse', 20);
INSERT INTO orders (id, user_id, product_id, total, created_at, deleted_at) VALUES
    (1, 1, 1, 1500, '2025-08-01 10:00:00', NULL),
    (2, 1, 2, 20, '2025-08-02 09:00:00', NULL),
    (3, 2, 2, 40, '2025-08-01 12:00:00', NULL),
    (4, 3, 1, 1500, '2025-07-01 08:00:00', '2025-07-02 00:00:00');
INSERT INTO bans (id, user_id, reason) VALUES
    (1, 3, 'spam');
";

/// In-memory database with fixture schema and seed rows.
pub fn setup() -> Connection {
    let conn = open_db_in_memory(MIGRATIONS).unwrap();
    conn.execute_batch(SEED).unwrap();
    conn
}

pub fn ids<E, F>(items: &[E], id: F) -> Vec<i64>
where
    F: Fn(&E) -> i64,
{
    let mut ids: Vec<i64> = items.iter().map(id).collect();
    ids.sort_unstable();
    ids
}

pub fn user_ids(users: &[User]) -> Vec<i64> {
    ids(users, |user| user.id)
}

pub fn user_name(conn: &Connection, id: i64) -> Option<String> {
    conn.query_row("SELECT name FROM users WHERE id = ?1;", [id], |row| {
        row.get(0)
    })
    .ok()
}
