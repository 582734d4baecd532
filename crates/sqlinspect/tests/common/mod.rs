#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::{self, BoxFuture, FutureExt};
use sqlinspect::connection::ConnectionResult;
use sqlinspect::prelude::*;

/// `exist_db.exist_tb_1`, as the server reports it.
pub const EXIST_TB_1: &str = "CREATE TABLE `exist_tb_1` (\n  \
    `id` bigint unsigned NOT NULL AUTO_INCREMENT,\n  \
    `v1` varchar(255) NOT NULL DEFAULT \"v1\" COMMENT \"unit test\",\n  \
    `v2` varchar(255),\n  \
    PRIMARY KEY (`id`),\n  \
    UNIQUE KEY `uniq_1` (`v1`,`v2`)\n\
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4";

/// `exist_db.exist_tb_2`, without a primary key.
pub const EXIST_TB_2: &str = "CREATE TABLE `exist_tb_2` (\n  \
    `v1` varchar(255) COMMENT \"unit test\",\n  \
    `v2` int COMMENT \"unit test\"\n\
    ) ENGINE=InnoDB COMMENT=\"unit test\"";

/// `exist_db.exist_tb_3`, with a binary column.
pub const EXIST_TB_3: &str = "CREATE TABLE `exist_tb_3` (\n  \
    `id` int NOT NULL,\n  \
    `data` varbinary(16),\n  \
    PRIMARY KEY (`id`)\n\
    ) ENGINE=InnoDB";

/// An in-memory server answering from fixed data.
#[derive(Debug, Default)]
pub struct MockConnection {
    databases: Vec<String>,
    tables: HashMap<String, Vec<(String, String)>>,
    responses: HashMap<String, Vec<Row>>,
    variables: HashMap<String, String>,
    failing: Mutex<Vec<String>>,
    queried: Mutex<Vec<String>>,
    executed: Mutex<Vec<String>>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database(mut self, name: &str) -> Self {
        self.databases.push(name.to_string());
        self.tables.entry(name.to_string()).or_default();
        self
    }

    pub fn table(mut self, schema: &str, name: &str, create: &str) -> Self {
        self.tables
            .entry(schema.to_string())
            .or_default()
            .push((name.to_string(), create.to_string()));
        self
    }

    pub fn rows(mut self, sql: &str, rows: Vec<Row>) -> Self {
        self.responses.insert(sql.to_string(), rows);
        self
    }

    pub fn variable(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_string(), value.to_string());
        self
    }

    /// Makes the next call whose text contains `needle` time out.
    ///
    /// Calls without SQL of their own are matched on the statement the
    /// server would run: `SHOW DATABASES`, ``SHOW TABLES FROM `s` ``,
    /// ``SHOW CREATE TABLE `s`.`t` `` and `SELECT @@name`.
    pub fn fails_once(self, needle: &str) -> Self {
        self.failing.lock().unwrap().push(needle.to_string());
        self
    }

    /// Fails the call once if a pending failure matches `call`.
    fn check(&self, call: &str) -> ConnectionResult<()> {
        let mut failing = self.failing.lock().unwrap();
        match failing.iter().position(|needle| call.contains(needle.as_str())) {
            Some(i) => {
                failing.remove(i);
                Err(ConnectionError::Timeout(30))
            }
            None => Ok(()),
        }
    }

    /// Every query run so far, in order.
    pub fn queried(&self) -> Vec<String> {
        self.queried.lock().unwrap().clone()
    }

    /// Every statement executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl Connection for MockConnection {
    fn list_databases(&self) -> BoxFuture<'_, ConnectionResult<Vec<String>>> {
        let result = self
            .check("SHOW DATABASES")
            .map(|()| self.databases.clone());
        future::ready(result).boxed()
    }

    fn list_tables<'a>(&'a self, schema: &'a str) -> BoxFuture<'a, ConnectionResult<Vec<String>>> {
        let result = self.check(&format!("SHOW TABLES FROM `{schema}`")).map(|()| {
            self.tables
                .get(schema)
                .map(|tables| tables.iter().map(|(name, _)| name.clone()).collect())
                .unwrap_or_default()
        });
        future::ready(result).boxed()
    }

    fn show_create_table<'a>(
        &'a self,
        schema: &'a str,
        table: &'a str,
    ) -> BoxFuture<'a, ConnectionResult<Option<String>>> {
        let call = format!("SHOW CREATE TABLE `{schema}`.`{table}`");
        let result = self.check(&call).map(|()| {
            self.tables.get(schema).and_then(|tables| {
                tables
                    .iter()
                    .find(|(name, _)| name == table)
                    .map(|(_, create)| create.clone())
            })
        });
        future::ready(result).boxed()
    }

    fn query<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, ConnectionResult<Vec<Row>>> {
        self.queried.lock().unwrap().push(sql.to_string());
        let result = self
            .check(sql)
            .map(|()| self.responses.get(sql).cloned().unwrap_or_default());
        future::ready(result).boxed()
    }

    fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, ConnectionResult<u64>> {
        let result = self.check(sql).map(|()| {
            self.executed.lock().unwrap().push(sql.to_string());
            0
        });
        future::ready(result).boxed()
    }

    fn system_variable<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, ConnectionResult<Option<String>>> {
        let result = self
            .check(&format!("SELECT @@{name}"))
            .map(|()| self.variables.get(name).cloned());
        future::ready(result).boxed()
    }
}

/// A server with `exist_db` holding the three fixture tables.
pub fn fixture() -> MockConnection {
    MockConnection::new()
        .database("exist_db")
        .table("exist_db", "exist_tb_1", EXIST_TB_1)
        .table("exist_db", "exist_tb_2", EXIST_TB_2)
        .table("exist_db", "exist_tb_3", EXIST_TB_3)
        .variable("lower_case_table_names", "0")
        .variable("default_storage_engine", "InnoDB")
}

pub fn session_with(mock: &Arc<MockConnection>, config: InspectConfig) -> Session {
    let rules = Arc::new(RuleCatalog::from_config(&config).unwrap());
    let connection: Arc<dyn Connection> = mock.clone();
    Session::new(Some(connection), rules, Arc::new(config))
}

pub fn session(mock: &Arc<MockConnection>) -> Session {
    session_with(mock, InspectConfig::default())
}

pub fn offline_session() -> Session {
    Session::new(
        None,
        Arc::new(RuleCatalog::builtin()),
        Arc::new(InspectConfig::default()),
    )
}

pub fn catalog(mock: &Arc<MockConnection>) -> Catalog {
    let connection: Arc<dyn Connection> = mock.clone();
    Catalog::new(Some(connection))
}

/// A row of text values; `None` is NULL.
pub fn row(pairs: &[(&str, Option<&str>)]) -> Row {
    Row::from_text(pairs.iter().copied())
}

/// The single-value result of `SELECT COUNT(*)`.
pub fn count(n: u64) -> Vec<Row> {
    let text = n.to_string();
    vec![row(&[("COUNT(*)", Some(text.as_str()))])]
}

/// The size and row estimate query for a table.
pub fn stats_sql(schema: &str, table: &str) -> String {
    format!(
        "SELECT (DATA_LENGTH + INDEX_LENGTH) / 1024 / 1024 AS size_mb, TABLE_ROWS AS table_rows \
         FROM information_schema.TABLES WHERE TABLE_SCHEMA = '{schema}' AND TABLE_NAME = '{table}'"
    )
}

/// A stats result reporting `size_mb` and `rows`.
pub fn stats(size_mb: &str, rows: &str) -> Vec<Row> {
    vec![row(&[("size_mb", Some(size_mb)), ("table_rows", Some(rows))])]
}
