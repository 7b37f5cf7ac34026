#![allow(dead_code)]

use jobly::{DbConfig, SqlLogConfig, TracedClient};
use rust_decimal::Decimal;

/// Session-local copies of the schema; each test connection gets its own.
const SCHEMA: &str = r#"
CREATE TEMP TABLE companies (
    handle VARCHAR(25) PRIMARY KEY CHECK (handle = lower(handle)),
    name TEXT UNIQUE NOT NULL,
    num_employees INTEGER CHECK (num_employees >= 0),
    description TEXT NOT NULL,
    logo_url TEXT
);

CREATE TEMP TABLE jobs (
    id SERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    salary INTEGER CHECK (salary >= 0),
    equity NUMERIC CHECK (equity <= 1.0),
    company_handle VARCHAR(25) NOT NULL REFERENCES companies ON DELETE CASCADE
);

INSERT INTO companies (handle, name, num_employees, description, logo_url)
VALUES ('c1', 'C1', 1, 'Desc1', 'http://c1.img'),
       ('c2', 'C2', 2, 'Desc2', 'http://c2.img'),
       ('c3', 'C3', 3, 'Desc3', 'http://c3.img');

INSERT INTO jobs (title, salary, equity, company_handle)
VALUES ('j1', 100000, '0.01', 'c1'),
       ('j2', 200000, '0.02', 'c2'),
       ('j3', 300000, '0.03', 'c3'),
       ('j4', 400000, NULL, 'c1');
"#;

/// Connect to `DATABASE_URL` and seed temp tables, or `None` to skip the test.
pub async fn setup(test_name: &str) -> Option<TracedClient<tokio_postgres::Client>> {
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(v) => v,
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test_name}");
            return None;
        }
    };

    let config = DbConfig::new(database_url).sql_log(SqlLogConfig::new().no_truncate());
    let client = jobly::connect(&config)
        .await
        .expect("Failed to connect to DATABASE_URL");
    client
        .inner()
        .batch_execute(SCHEMA)
        .await
        .expect("Failed to create test schema");
    Some(client)
}

pub fn equity(hundredths: i64) -> Option<Decimal> {
    Some(Decimal::new(hundredths, 2))
}
