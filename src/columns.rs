/// A selectable GraphQL field of `User` and the SQL that fetches it.
#[derive(Debug, PartialEq, Eq)]
pub struct Column {
    pub field: &'static str,
    pub expr: &'static str,
}

/// The primary key. Always fetched, since relation fields resolve from it.
pub const USER_PRIMARY_KEY: Column = Column { field: "id", expr: "id" };

/// Fields the `users` query may fetch. `birthday` is intentionally absent.
pub const USER_COLUMNS: &[Column] = &[
    USER_PRIMARY_KEY,
    Column { field: "name", expr: "name" },
    Column { field: "last_name", expr: "last_name" },
    Column { field: "email", expr: "email" },
    Column { field: "address", expr: "address" },
    Column { field: "email_verified_at", expr: "email_verified_at::text AS email_verified_at" },
    Column { field: "password", expr: "password" },
    Column { field: "remember_token", expr: "remember_token" },
    Column { field: "created_at", expr: "created_at::text AS created_at" },
    Column { field: "updated_at", expr: "updated_at::text AS updated_at" },
];

/// Intersects the requested field names with [`USER_COLUMNS`], keeping request order and
/// dropping repeats. The primary key is prepended when the caller did not ask for it.
pub fn select_user_columns<'a, I>(requested: I) -> Vec<&'static Column>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut columns: Vec<&'static Column> = Vec::new();
    for name in requested {
        let Some(column) = USER_COLUMNS.iter().find(|column| column.field == name) else {
            continue;
        };
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    if !columns.iter().any(|column| column.field == USER_PRIMARY_KEY.field) {
        columns.insert(0, &USER_COLUMNS[0]);
    }
    columns
}
