// used for persistence
use rusqlite::{Connection, Row, params, params_from_iter};
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::data::NewExample;
use crate::error::Result;
use crate::label::{
    ExampleId, LabelTypeId, LabelTypeKind, NewCategory, NewLabel, NewRelation, NewSpan,
    NewTextLabel, ProjectId, SpanId, UserId,
};
use crate::label_type::NewLabelType;

// SQLite limits the number of bound parameters per statement
const MAX_BOUND_PARAMETERS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceMode {
    InMemory,
    File(String),
}

/// Opens a connection and makes sure the schema exists.
pub fn open(mode: &PersistenceMode) -> Result<Connection> {
    let connection = match mode {
        PersistenceMode::InMemory => Connection::open_in_memory()?,
        PersistenceMode::File(path) => Connection::open(path)?,
    };
    // has no effect inside a transaction, so it is set per connection
    connection.pragma_update(None, "foreign_keys", true)?;
    Persistor::create_schema(&connection)?;
    Ok(connection)
}

// ------------- Durable rows -------------
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub id: ExampleId,
    pub uuid: Uuid,
    pub project: ProjectId,
    pub filename: String,
    pub upload_name: String,
    pub text: Option<String>,
    pub meta: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTypeRow {
    pub id: LabelTypeId,
    pub project: ProjectId,
    pub kind: LabelTypeKind,
    pub text: String,
    pub background_color: String,
    pub text_color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    pub id: i64,
    pub example: ExampleId,
    pub user: UserId,
    pub label_type: LabelTypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRow {
    pub id: SpanId,
    pub uuid: Uuid,
    pub example: ExampleId,
    pub user: UserId,
    pub label_type: LabelTypeId,
    pub start_offset: usize,
    pub end_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLabelRow {
    pub id: i64,
    pub example: ExampleId,
    pub user: UserId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRow {
    pub id: i64,
    pub example: ExampleId,
    pub user: UserId,
    pub label_type: LabelTypeId,
    pub from_span: SpanId,
    pub to_span: SpanId,
}

/// Row counts per durable label table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LabelCounts {
    pub categories: usize,
    pub spans: usize,
    pub texts: usize,
    pub relations: usize,
}
impl std::ops::AddAssign for LabelCounts {
    fn add_assign(&mut self, other: Self) {
        self.categories += other.categories;
        self.spans += other.spans;
        self.texts += other.texts;
        self.relations += other.relations;
    }
}

// ------------- Persistence -------------
pub struct Persistor<'db> {
    pub db: &'db Connection,
}
impl<'db> Persistor<'db> {
    pub fn new(connection: &Connection) -> Persistor<'_> {
        Persistor { db: connection }
    }
    pub fn create_schema(connection: &Connection) -> Result<()> {
        // The "STRICT" keyword introduced in 3.37.0 breaks JDBC connections, which makes
        // debugging using an external tool like DBeaver impossible
        connection.execute_batch(
            "
            create table if not exists Example (
                Example_Identity integer not null,
                Example_Uuid blob not null,
                Project_Identity integer not null,
                Filename text not null,
                Upload_Name text not null,
                Text text null,
                Meta text not null,
                Created_At text not null,
                constraint referenceable_Example_Identity primary key (
                    Example_Identity
                ),
                constraint unique_Example_Uuid unique (
                    Example_Uuid
                )
            );-- STRICT;
            create index if not exists Example_by_Project on Example (Project_Identity);
            create table if not exists LabelType (
                LabelType_Identity integer not null,
                Project_Identity integer not null,
                Kind text not null,
                Text text not null,
                Background_Color text not null,
                Text_Color text not null,
                constraint referenceable_LabelType_Identity primary key (
                    LabelType_Identity
                ),
                constraint unique_LabelType unique (
                    Project_Identity,
                    Kind,
                    Text
                )
            );-- STRICT;
            create table if not exists Category (
                Category_Identity integer not null,
                Example_Identity integer not null,
                User_Identity integer not null,
                LabelType_Identity integer not null,
                constraint Category_on_Example foreign key (
                    Example_Identity
                ) references Example(Example_Identity),
                constraint Category_has_LabelType foreign key (
                    LabelType_Identity
                ) references LabelType(LabelType_Identity),
                constraint referenceable_Category_Identity primary key (
                    Category_Identity
                )
            );-- STRICT;
            create table if not exists Span (
                Span_Identity integer not null,
                Span_Uuid blob not null,
                Example_Identity integer not null,
                User_Identity integer not null,
                LabelType_Identity integer not null,
                Start_Offset integer not null,
                End_Offset integer not null,
                constraint Span_on_Example foreign key (
                    Example_Identity
                ) references Example(Example_Identity),
                constraint Span_has_LabelType foreign key (
                    LabelType_Identity
                ) references LabelType(LabelType_Identity),
                constraint referenceable_Span_Identity primary key (
                    Span_Identity
                ),
                constraint unique_Span_Uuid unique (
                    Span_Uuid
                ),
                constraint Start_Offset_before_End_Offset check (
                    Start_Offset >= 0 and Start_Offset < End_Offset
                )
            );-- STRICT;
            create table if not exists TextLabel (
                TextLabel_Identity integer not null,
                Example_Identity integer not null,
                User_Identity integer not null,
                Text text not null,
                constraint TextLabel_on_Example foreign key (
                    Example_Identity
                ) references Example(Example_Identity),
                constraint referenceable_TextLabel_Identity primary key (
                    TextLabel_Identity
                )
            );-- STRICT;
            create table if not exists Relation (
                Relation_Identity integer not null,
                Example_Identity integer not null,
                User_Identity integer not null,
                LabelType_Identity integer not null,
                From_Span_Identity integer not null,
                To_Span_Identity integer not null,
                constraint Relation_on_Example foreign key (
                    Example_Identity
                ) references Example(Example_Identity),
                constraint Relation_has_LabelType foreign key (
                    LabelType_Identity
                ) references LabelType(LabelType_Identity),
                constraint Relation_from_Span foreign key (
                    From_Span_Identity
                ) references Span(Span_Identity),
                constraint Relation_to_Span foreign key (
                    To_Span_Identity
                ) references Span(Span_Identity),
                constraint referenceable_Relation_Identity primary key (
                    Relation_Identity
                )
            );-- STRICT;
            ",
        )?;
        Ok(())
    }

    // ------------- Adders -------------
    // Every adder inserts row by row on the caller's connection, which is
    // expected to be inside a transaction, and returns identities in input order.
    pub fn add_examples(&self, examples: &[NewExample]) -> Result<Vec<Example>> {
        let mut add_example = self.db.prepare_cached(
            "
            insert into Example (
                Example_Uuid,
                Project_Identity,
                Filename,
                Upload_Name,
                Text,
                Meta,
                Created_At
            ) values (?, ?, ?, ?, ?, ?, ?)
            ",
        )?;
        let mut added = Vec::with_capacity(examples.len());
        for example in examples {
            let created_at = Utc::now();
            let id = add_example.insert(params![
                &example.uuid,
                &example.project,
                &example.filename,
                &example.upload_name,
                &example.text,
                &example.meta,
                &created_at
            ])?;
            added.push(Example {
                id,
                uuid: example.uuid,
                project: example.project,
                filename: example.filename.clone(),
                upload_name: example.upload_name.clone(),
                text: example.text.clone(),
                meta: example.meta.clone(),
                created_at,
            });
        }
        Ok(added)
    }
    /// Returns how many label types were new; existing ones are left untouched.
    pub fn add_label_types_ignoring_conflicts(&self, label_types: &[NewLabelType]) -> Result<usize> {
        let mut add_label_type = self.db.prepare_cached(
            "
            insert or ignore into LabelType (
                Project_Identity,
                Kind,
                Text,
                Background_Color,
                Text_Color
            ) values (?, ?, ?, ?, ?)
            ",
        )?;
        let mut added = 0;
        for label_type in label_types {
            added += add_label_type.execute(params![
                &label_type.project,
                label_type.kind.as_str(),
                &label_type.text,
                &label_type.background_color,
                &label_type.text_color
            ])?;
        }
        Ok(added)
    }
    pub fn add_categories(&self, categories: &[NewCategory]) -> Result<Vec<i64>> {
        let mut add_category = self.db.prepare_cached(
            "
            insert into Category (
                Example_Identity,
                User_Identity,
                LabelType_Identity
            ) values (?, ?, ?)
            ",
        )?;
        let mut ids = Vec::with_capacity(categories.len());
        for category in categories {
            ids.push(add_category.insert(params![
                &category.example,
                &category.user,
                &category.label_type
            ])?);
        }
        Ok(ids)
    }
    pub fn add_spans(&self, spans: &[NewSpan]) -> Result<Vec<SpanId>> {
        let mut add_span = self.db.prepare_cached(
            "
            insert into Span (
                Span_Uuid,
                Example_Identity,
                User_Identity,
                LabelType_Identity,
                Start_Offset,
                End_Offset
            ) values (?, ?, ?, ?, ?, ?)
            ",
        )?;
        let mut ids = Vec::with_capacity(spans.len());
        for span in spans {
            ids.push(add_span.insert(params![
                &span.uuid,
                &span.example,
                &span.user,
                &span.label_type,
                span.start_offset as i64,
                span.end_offset as i64
            ])?);
        }
        Ok(ids)
    }
    pub fn add_text_labels(&self, texts: &[NewTextLabel]) -> Result<Vec<i64>> {
        let mut add_text_label = self.db.prepare_cached(
            "
            insert into TextLabel (
                Example_Identity,
                User_Identity,
                Text
            ) values (?, ?, ?)
            ",
        )?;
        let mut ids = Vec::with_capacity(texts.len());
        for text in texts {
            ids.push(add_text_label.insert(params![&text.example, &text.user, &text.content])?);
        }
        Ok(ids)
    }
    pub fn add_relations(&self, relations: &[NewRelation]) -> Result<Vec<i64>> {
        let mut add_relation = self.db.prepare_cached(
            "
            insert into Relation (
                Example_Identity,
                User_Identity,
                LabelType_Identity,
                From_Span_Identity,
                To_Span_Identity
            ) values (?, ?, ?, ?, ?)
            ",
        )?;
        let mut ids = Vec::with_capacity(relations.len());
        for relation in relations {
            ids.push(add_relation.insert(params![
                &relation.example,
                &relation.user,
                &relation.label_type,
                &relation.from_span,
                &relation.to_span
            ])?);
        }
        Ok(ids)
    }
    /// Splits mixed drafts per table and inserts spans before relations.
    pub fn add_labels(&self, labels: &[NewLabel]) -> Result<LabelCounts> {
        let mut categories = Vec::new();
        let mut spans = Vec::new();
        let mut texts = Vec::new();
        let mut relations = Vec::new();
        for label in labels {
            match label {
                NewLabel::Category(category) => categories.push(category.clone()),
                NewLabel::Span(span) => spans.push(span.clone()),
                NewLabel::Text(text) => texts.push(text.clone()),
                NewLabel::Relation(relation) => relations.push(relation.clone()),
            }
        }
        Ok(LabelCounts {
            spans: self.add_spans(&spans)?.len(),
            categories: self.add_categories(&categories)?.len(),
            texts: self.add_text_labels(&texts)?.len(),
            relations: self.add_relations(&relations)?.len(),
        })
    }

    // ------------- Queries -------------
    pub fn label_types(&self, project: ProjectId, kind: LabelTypeKind) -> Result<Vec<LabelTypeRow>> {
        let mut get_label_types = self.db.prepare_cached(
            "
            select LabelType_Identity,
                    Project_Identity,
                    Text,
                    Background_Color,
                    Text_Color
                from LabelType
                where Project_Identity = ?
                and Kind = ?
                order by LabelType_Identity
            ",
        )?;
        let rows = get_label_types.query_map(params![&project, kind.as_str()], |row| {
            Ok(LabelTypeRow {
                id: row.get(0)?,
                project: row.get(1)?,
                kind,
                text: row.get(2)?,
                background_color: row.get(3)?,
                text_color: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
    pub fn examples(&self, project: ProjectId) -> Result<Vec<Example>> {
        let mut get_examples = self.db.prepare_cached(
            "
            select Example_Identity,
                    Example_Uuid,
                    Project_Identity,
                    Filename,
                    Upload_Name,
                    Text,
                    Meta,
                    Created_At
                from Example
                where Project_Identity = ?
                order by Example_Identity
            ",
        )?;
        let rows = get_examples.query_map(params![&project], |row| {
            Ok(Example {
                id: row.get(0)?,
                uuid: row.get(1)?,
                project: row.get(2)?,
                filename: row.get(3)?,
                upload_name: row.get(4)?,
                text: row.get(5)?,
                meta: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
    pub fn categories(&self, project: ProjectId) -> Result<Vec<CategoryRow>> {
        let mut get_categories = self.db.prepare_cached(
            "
            select c.Category_Identity,
                    c.Example_Identity,
                    c.User_Identity,
                    c.LabelType_Identity
                from Category c
                join Example e
                on e.Example_Identity = c.Example_Identity
                where e.Project_Identity = ?
                order by c.Category_Identity
            ",
        )?;
        let rows = get_categories.query_map(params![&project], |row| {
            Ok(CategoryRow {
                id: row.get(0)?,
                example: row.get(1)?,
                user: row.get(2)?,
                label_type: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
    pub fn spans(&self, project: ProjectId) -> Result<Vec<SpanRow>> {
        let mut get_spans = self.db.prepare_cached(
            "
            select s.Span_Identity,
                    s.Span_Uuid,
                    s.Example_Identity,
                    s.User_Identity,
                    s.LabelType_Identity,
                    s.Start_Offset,
                    s.End_Offset
                from Span s
                join Example e
                on e.Example_Identity = s.Example_Identity
                where e.Project_Identity = ?
                order by s.Span_Identity
            ",
        )?;
        let rows = get_spans.query_map(params![&project], span_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
    /// The durable spans carrying any of the given uuids.
    pub fn spans_by_uuid(&self, uuids: &[Uuid]) -> Result<Vec<SpanRow>> {
        let mut spans = Vec::with_capacity(uuids.len());
        for chunk in uuids.chunks(MAX_BOUND_PARAMETERS) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut get_spans = self.db.prepare(&format!(
                "
                select Span_Identity,
                        Span_Uuid,
                        Example_Identity,
                        User_Identity,
                        LabelType_Identity,
                        Start_Offset,
                        End_Offset
                    from Span
                    where Span_Uuid in ({placeholders})
                "
            ))?;
            let rows = get_spans.query_map(params_from_iter(chunk.iter()), span_row)?;
            for row in rows {
                spans.push(row?);
            }
        }
        Ok(spans)
    }
    pub fn text_labels(&self, project: ProjectId) -> Result<Vec<TextLabelRow>> {
        let mut get_text_labels = self.db.prepare_cached(
            "
            select t.TextLabel_Identity,
                    t.Example_Identity,
                    t.User_Identity,
                    t.Text
                from TextLabel t
                join Example e
                on e.Example_Identity = t.Example_Identity
                where e.Project_Identity = ?
                order by t.TextLabel_Identity
            ",
        )?;
        let rows = get_text_labels.query_map(params![&project], |row| {
            Ok(TextLabelRow {
                id: row.get(0)?,
                example: row.get(1)?,
                user: row.get(2)?,
                content: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
    pub fn relations(&self, project: ProjectId) -> Result<Vec<RelationRow>> {
        let mut get_relations = self.db.prepare_cached(
            "
            select r.Relation_Identity,
                    r.Example_Identity,
                    r.User_Identity,
                    r.LabelType_Identity,
                    r.From_Span_Identity,
                    r.To_Span_Identity
                from Relation r
                join Example e
                on e.Example_Identity = r.Example_Identity
                where e.Project_Identity = ?
                order by r.Relation_Identity
            ",
        )?;
        let rows = get_relations.query_map(params![&project], |row| {
            Ok(RelationRow {
                id: row.get(0)?,
                example: row.get(1)?,
                user: row.get(2)?,
                label_type: row.get(3)?,
                from_span: row.get(4)?,
                to_span: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

fn span_row(row: &Row) -> rusqlite::Result<SpanRow> {
    let start_offset: i64 = row.get(5)?;
    let end_offset: i64 = row.get(6)?;
    Ok(SpanRow {
        id: row.get(0)?,
        uuid: row.get(1)?,
        example: row.get(2)?,
        user: row.get(3)?,
        label_type: row.get(4)?,
        start_offset: start_offset as usize,
        end_offset: end_offset as usize,
    })
}
