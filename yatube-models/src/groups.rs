use crate::{
    schema::{groups, posts},
    Connection, Error, Result,
};
use diesel::{self, ExpressionMethods, QueryDsl, RunQueryDsl};
use heck::KebabCase;

#[derive(Queryable, Identifiable, Clone, Debug, PartialEq, Serialize)]
pub struct Group {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Insertable)]
#[table_name = "groups"]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl Group {
    insert!(groups, NewGroup);
    get!(groups);
    find_by!(groups, find_by_slug, slug as &str);

    pub fn list(conn: &Connection) -> Result<Vec<Group>> {
        groups::table
            .order(groups::title.asc())
            .load::<Group>(conn)
            .map_err(Error::from)
    }

    pub fn count_posts(&self, conn: &Connection) -> Result<i64> {
        posts::table
            .filter(posts::group_id.eq(self.id))
            .count()
            .get_result(conn)
            .map_err(Error::from)
    }

    /// Removes the group, its posts stay published without a group.
    pub fn delete(&self, conn: &Connection) -> Result<()> {
        diesel::delete(self)
            .execute(conn)
            .map(|_| ())
            .map_err(Error::from)
    }

    pub fn slugify(title: &str) -> String {
        title.to_kebab_case()
    }

    /// The slug derived from `title`, if it makes a valid one. Titles in
    /// other scripts than latin don't.
    pub fn slug_for(title: &str) -> Option<String> {
        Some(Group::slugify(title)).filter(|slug| Group::is_valid_slug(slug))
    }

    pub fn is_valid_slug(slug: &str) -> bool {
        !slug.is_empty()
            && slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl NewGroup {
    /// Creates a group. The slug is derived from the title when none is given.
    pub fn create(
        conn: &Connection,
        title: String,
        slug: Option<String>,
        description: String,
    ) -> Result<Group> {
        let slug = slug.unwrap_or_else(|| Group::slugify(&title));
        if title.trim().is_empty() {
            return Err(Error::InvalidArgument("a group needs a title".to_owned()));
        }
        if !Group::is_valid_slug(&slug) {
            return Err(Error::InvalidArgument(format!(
                "{:?} is not a valid slug, only latin letters, digits, - and _ are allowed",
                slug
            )));
        }
        if Group::find_by_slug(conn, &slug).is_ok() {
            return Err(Error::InvalidArgument(format!(
                "a group with the slug {:?} already exists",
                slug
            )));
        }

        let group = Group::insert(
            conn,
            NewGroup {
                title,
                slug,
                description,
            },
        )?;
        info!("Created group {}", group.slug);
        Ok(group)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{tests::db, Connection as Conn};
    use diesel::Connection;

    pub(crate) fn fill_database(conn: &Conn) -> Vec<Group> {
        vec![
            NewGroup::create(
                conn,
                "Cats".to_owned(),
                None,
                "Everything about cats".to_owned(),
            )
            .unwrap(),
            NewGroup::create(
                conn,
                "Rust programming".to_owned(),
                Some("rust".to_owned()),
                String::new(),
            )
            .unwrap(),
        ]
    }

    #[test]
    fn slugs() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            let groups = fill_database(&conn);
            assert_eq!(groups[0].slug, "cats");
            assert_eq!(groups[1].slug, "rust");
            assert_eq!(Group::find_by_slug(&conn, "cats").unwrap(), groups[0]);
            assert_eq!(Group::slugify("Rust programming"), "rust-programming");
            assert_eq!(Group::slug_for("Rust programming").as_deref(), Some("rust-programming"));
            assert_eq!(Group::slug_for("Лев Толстой"), None);
            assert_eq!(Group::slug_for("?!"), None);
            assert!(matches!(
                Group::find_by_slug(&conn, "dogs"),
                Err(Error::NotFound)
            ));
            Ok(())
        });
    }

    #[test]
    fn rejects_bad_groups() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            fill_database(&conn);
            let duplicate = NewGroup::create(&conn, "Dogs".to_owned(), Some("cats".to_owned()), String::new());
            assert!(matches!(duplicate, Err(Error::InvalidArgument(_))));
            let bad_slug = NewGroup::create(&conn, "Dogs".to_owned(), Some("dogs?".to_owned()), String::new());
            assert!(matches!(bad_slug, Err(Error::InvalidArgument(_))));
            let no_title = NewGroup::create(&conn, " ".to_owned(), Some("blank".to_owned()), String::new());
            assert!(matches!(no_title, Err(Error::InvalidArgument(_))));
            Ok(())
        });
    }

    #[test]
    fn list_is_sorted() {
        let conn = db();
        conn.test_transaction::<_, (), _>(|| {
            fill_database(&conn);
            let titles: Vec<String> = Group::list(&conn)
                .unwrap()
                .into_iter()
                .map(|g| g.title)
                .collect();
            assert_eq!(titles, vec!["Cats", "Rust programming"]);
            Ok(())
        });
    }
}
