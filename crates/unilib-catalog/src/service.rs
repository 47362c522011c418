//! Catalogue service implementation.
//!
//! This module provides the `Catalog` trait and the `CatalogService`
//! implementation that routes every operation to its tenant and sequences
//! mirrored writes.

use std::sync::Arc;

use async_trait::async_trait;
use unilib_core::{EntityKind, TenantId};
use unilib_store::repository::populate;
use unilib_store::types::{
    Author, AuthorPatch, Book, BookPatch, Borrow, BorrowPatch, Employee, EmployeePatch, Student,
    StudentPatch,
};
use unilib_store::{ConnectionRegistry, Document, Filter, Populated, Record};

use crate::error::{CatalogError, Result};
use crate::orchestrator::Orchestrator;
use crate::policy::TenantPolicy;
use crate::query::QueryService;
use crate::types::{CatalogConfig, ListQuery, LoanKey, Page};

/// Trait defining the catalogue operations.
///
/// Keyed operations resolve the owning tenant from the business key. List
/// operations read the tenant named in the query, or the kind's default
/// database.
#[async_trait]
pub trait Catalog: Send + Sync {
    // =========================================================================
    // Authors
    // =========================================================================

    /// Create an author in the aggregate database.
    ///
    /// # Errors
    ///
    /// Returns a `DuplicateKey` store error if the code is taken.
    async fn create_author(&self, author: Author) -> Result<Record<Author>>;

    /// Update an author by code.
    async fn update_author(&self, code: &str, patch: AuthorPatch) -> Result<Record<Author>>;

    /// Delete an author by code.
    async fn delete_author(&self, code: &str) -> Result<Record<Author>>;

    /// List authors.
    async fn list_authors(&self, query: ListQuery) -> Result<Page<Record<Author>>>;

    /// Get an author by code.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no author has this code.
    async fn find_author_by_code(&self, code: &str) -> Result<Record<Author>>;

    // =========================================================================
    // Books
    // =========================================================================

    /// Create a book in its tenant and the aggregate.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::AuthorNotFound` if the referenced author is not in
    /// the aggregate database; nothing is written in that case.
    async fn create_book(&self, book: Book) -> Result<Record<Book>>;

    /// Update a book by code.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the owning tenant has no such book,
    /// or a `Validation` store error if the patch breaks a book rule.
    async fn update_book(&self, code: &str, patch: BookPatch) -> Result<Record<Book>>;

    /// Delete a book by code.
    async fn delete_book(&self, code: &str) -> Result<Record<Book>>;

    /// List books.
    async fn list_books(&self, query: ListQuery) -> Result<Page<Record<Book>>>;

    /// List books with their authors expanded.
    async fn list_books_with_author(
        &self,
        query: ListQuery,
    ) -> Result<Page<Populated<Book, Author>>>;

    /// Get a book by code.
    async fn find_book_by_code(&self, code: &str) -> Result<Record<Book>>;

    /// Get a book by code with its author expanded.
    async fn find_book_with_author(&self, code: &str) -> Result<Populated<Book, Author>>;

    // =========================================================================
    // Students
    // =========================================================================

    /// Create a student in the tenant named by its `university`.
    async fn create_student(&self, student: Student) -> Result<Record<Student>>;

    /// Update a student by code.
    async fn update_student(&self, code: &str, patch: StudentPatch) -> Result<Record<Student>>;

    /// Delete a student by code.
    async fn delete_student(&self, code: &str) -> Result<Record<Student>>;

    /// List students.
    async fn list_students(&self, query: ListQuery) -> Result<Page<Record<Student>>>;

    /// Get a student by code.
    async fn find_student_by_code(&self, code: &str) -> Result<Record<Student>>;

    // =========================================================================
    // Employees
    // =========================================================================

    /// Create an employee.
    async fn create_employee(&self, employee: Employee) -> Result<Record<Employee>>;

    /// Update an employee by code.
    async fn update_employee(&self, code: &str, patch: EmployeePatch)
        -> Result<Record<Employee>>;

    /// Delete an employee by code.
    async fn delete_employee(&self, code: &str) -> Result<Record<Employee>>;

    /// List employees.
    async fn list_employees(&self, query: ListQuery) -> Result<Page<Record<Employee>>>;

    /// Get an employee by code.
    async fn find_employee_by_code(&self, code: &str) -> Result<Record<Employee>>;

    // =========================================================================
    // Borrows
    // =========================================================================

    /// Record a loan in the tenant of the borrowing student.
    async fn create_borrow(&self, borrow: Borrow) -> Result<Record<Borrow>>;

    /// Update a loan.
    ///
    /// When several loans share the key, the earliest is updated. Each
    /// database picks its own earliest match, so if creates with the same key
    /// interleave, the aggregate may patch a different loan than the tenant.
    async fn update_borrow(&self, key: &LoanKey, patch: BorrowPatch) -> Result<Record<Borrow>>;

    /// Delete a loan.
    ///
    /// Picks the earliest match per database, as `update_borrow` does.
    async fn delete_borrow(&self, key: &LoanKey) -> Result<Record<Borrow>>;

    /// List loans.
    async fn list_borrows(&self, query: ListQuery) -> Result<Page<Record<Borrow>>>;

    /// Get a loan.
    async fn find_borrow(&self, key: &LoanKey) -> Result<Record<Borrow>>;

    // =========================================================================
    // Operational
    // =========================================================================

    /// Number of open database connections.
    fn open_connections(&self) -> usize;
}

/// The main catalogue service implementation.
#[derive(Debug, Clone)]
pub struct CatalogService {
    registry: Arc<ConnectionRegistry>,
    config: CatalogConfig,
    writes: Orchestrator,
    reads: QueryService,
}

impl CatalogService {
    /// Create a new catalogue service.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>, config: CatalogConfig) -> Self {
        Self {
            writes: Orchestrator::new(Arc::clone(&registry)),
            reads: QueryService::new(Arc::clone(&registry)),
            registry,
            config,
        }
    }

    /// Create with default configuration.
    #[must_use]
    pub fn with_defaults(registry: Arc<ConnectionRegistry>) -> Self {
        Self::new(registry, CatalogConfig::default())
    }

    /// Get the connection registry.
    #[must_use]
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Routing rules for `kind`.
    #[must_use]
    pub fn policy(&self, kind: EntityKind) -> TenantPolicy {
        TenantPolicy::for_kind(kind, self.config.policy)
    }

    async fn update_by_code<D: Document>(&self, code: &str, patch: D::Patch) -> Result<Record<D>> {
        let placement = self.policy(D::KIND).place_code(code);
        self.writes
            .update(placement, code, Filter::eq("code", code), patch)
            .await
    }

    async fn delete_by_code<D: Document>(&self, code: &str) -> Result<Record<D>> {
        let placement = self.policy(D::KIND).place_code(code);
        self.writes
            .delete(placement, code, Filter::eq("code", code))
            .await
    }

    async fn find_by_code<D: Document>(&self, code: &str) -> Result<Record<D>> {
        let tenant = self.policy(D::KIND).resolve(code);
        self.reads.get(tenant, code, Filter::eq("code", code)).await
    }

    async fn list<D: Document>(&self, query: ListQuery) -> Result<Page<Record<D>>> {
        let policy = self.policy(D::KIND);
        let tenant = query.tenant.unwrap_or_else(|| policy.list_default());
        let filter = if policy.scopes_lists_by_university() {
            Filter::eq("university", tenant.as_str())
        } else {
            Filter::all()
        };

        self.reads
            .list(tenant, filter, query.pagination(), query.sorting())
            .await
    }

    async fn with_authors(&self, books: Vec<Record<Book>>) -> Result<Vec<Populated<Book, Author>>> {
        let authors = self
            .registry
            .repository::<Author>(TenantId::Universities)
            .await?;
        Ok(populate(books, &authors).await?)
    }
}

#[async_trait]
impl Catalog for CatalogService {
    async fn create_author(&self, author: Author) -> Result<Record<Author>> {
        let placement = self.policy(EntityKind::Author).place_code(&author.code);
        let code = author.code.clone();
        self.writes.create(placement, &code, author).await
    }

    async fn update_author(&self, code: &str, patch: AuthorPatch) -> Result<Record<Author>> {
        self.update_by_code(code, patch).await
    }

    async fn delete_author(&self, code: &str) -> Result<Record<Author>> {
        self.delete_by_code(code).await
    }

    async fn list_authors(&self, query: ListQuery) -> Result<Page<Record<Author>>> {
        self.list(query).await
    }

    async fn find_author_by_code(&self, code: &str) -> Result<Record<Author>> {
        self.find_by_code(code).await
    }

    async fn create_book(&self, book: Book) -> Result<Record<Book>> {
        let author = self
            .registry
            .repository::<Author>(TenantId::Universities)
            .await?
            .find_one(Filter::eq("code", book.author_id.as_str()))
            .await?;
        if author.is_none() {
            return Err(CatalogError::AuthorNotFound(book.author_id));
        }

        let placement = self.policy(EntityKind::Book).place_code(&book.code);
        let code = book.code.clone();
        self.writes.create(placement, &code, book).await
    }

    async fn update_book(&self, code: &str, patch: BookPatch) -> Result<Record<Book>> {
        self.update_by_code(code, patch).await
    }

    async fn delete_book(&self, code: &str) -> Result<Record<Book>> {
        self.delete_by_code(code).await
    }

    async fn list_books(&self, query: ListQuery) -> Result<Page<Record<Book>>> {
        self.list(query).await
    }

    async fn list_books_with_author(
        &self,
        query: ListQuery,
    ) -> Result<Page<Populated<Book, Author>>> {
        let page = self.list::<Book>(query).await?;
        let items = self.with_authors(page.items).await?;
        Ok(Page {
            total: page.total,
            page: page.page,
            limit: page.limit,
            items,
        })
    }

    async fn find_book_by_code(&self, code: &str) -> Result<Record<Book>> {
        self.find_by_code(code).await
    }

    async fn find_book_with_author(&self, code: &str) -> Result<Populated<Book, Author>> {
        let book = self.find_by_code::<Book>(code).await?;
        let mut populated = self.with_authors(vec![book]).await?;
        populated
            .pop()
            .ok_or_else(|| CatalogError::not_found(EntityKind::Book, code))
    }

    async fn create_student(&self, student: Student) -> Result<Record<Student>> {
        let placement = self.policy(EntityKind::Student).place(student.university);
        let code = student.code.clone();
        self.writes.create(placement, &code, student).await
    }

    async fn update_student(&self, code: &str, patch: StudentPatch) -> Result<Record<Student>> {
        self.update_by_code(code, patch).await
    }

    async fn delete_student(&self, code: &str) -> Result<Record<Student>> {
        self.delete_by_code(code).await
    }

    async fn list_students(&self, query: ListQuery) -> Result<Page<Record<Student>>> {
        self.list(query).await
    }

    async fn find_student_by_code(&self, code: &str) -> Result<Record<Student>> {
        self.find_by_code(code).await
    }

    async fn create_employee(&self, employee: Employee) -> Result<Record<Employee>> {
        let placement = self.policy(EntityKind::Employee).place_code(&employee.code);
        let code = employee.code.clone();
        self.writes.create(placement, &code, employee).await
    }

    async fn update_employee(
        &self,
        code: &str,
        patch: EmployeePatch,
    ) -> Result<Record<Employee>> {
        self.update_by_code(code, patch).await
    }

    async fn delete_employee(&self, code: &str) -> Result<Record<Employee>> {
        self.delete_by_code(code).await
    }

    async fn list_employees(&self, query: ListQuery) -> Result<Page<Record<Employee>>> {
        self.list(query).await
    }

    async fn find_employee_by_code(&self, code: &str) -> Result<Record<Employee>> {
        self.find_by_code(code).await
    }

    async fn create_borrow(&self, borrow: Borrow) -> Result<Record<Borrow>> {
        let placement = self
            .policy(EntityKind::Borrow)
            .place_code(&borrow.student_code);
        let key = LoanKey::new(borrow.book_code.as_str(), borrow.student_code.as_str()).to_string();
        self.writes.create(placement, &key, borrow).await
    }

    async fn update_borrow(&self, key: &LoanKey, patch: BorrowPatch) -> Result<Record<Borrow>> {
        let placement = self
            .policy(EntityKind::Borrow)
            .place_code(&key.student_code);
        self.writes
            .update(placement, &key.to_string(), key.filter(), patch)
            .await
    }

    async fn delete_borrow(&self, key: &LoanKey) -> Result<Record<Borrow>> {
        let placement = self
            .policy(EntityKind::Borrow)
            .place_code(&key.student_code);
        self.writes
            .delete(placement, &key.to_string(), key.filter())
            .await
    }

    async fn list_borrows(&self, query: ListQuery) -> Result<Page<Record<Borrow>>> {
        self.list(query).await
    }

    async fn find_borrow(&self, key: &LoanKey) -> Result<Record<Borrow>> {
        let tenant = self.policy(EntityKind::Borrow).resolve(&key.student_code);
        self.reads
            .get(tenant, &key.to_string(), key.filter())
            .await
    }

    fn open_connections(&self) -> usize {
        self.registry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyMode;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;
    use unilib_core::SortOrder;
    use unilib_store::{Endpoints, Repository, RocksConnector, StoreConfig, StoreError};

    fn registry_in(dir: &TempDir) -> Arc<ConnectionRegistry> {
        let endpoints = StoreConfig::with_data_dir(dir.path()).endpoints();
        Arc::new(ConnectionRegistry::new(Arc::new(RocksConnector), endpoints))
    }

    fn create_test_catalog(mode: PolicyMode) -> (CatalogService, TempDir) {
        let dir = TempDir::new().unwrap();
        let service = CatalogService::new(registry_in(&dir), CatalogConfig::with_policy(mode));
        (service, dir)
    }

    async fn repo<D: Document>(service: &CatalogService, tenant: TenantId) -> Repository<D> {
        service.registry().repository::<D>(tenant).await.unwrap()
    }

    fn author(code: &str, full_name: &str) -> Author {
        Author {
            code: code.to_string(),
            full_name: full_name.to_string(),
        }
    }

    fn book(code: &str, year: i32) -> Book {
        Book {
            code: code.to_string(),
            title: format!("Title {code}"),
            publisher: "Kim Dong".to_string(),
            year,
            kind: "comic".to_string(),
            quantity: 5,
            site: "north".to_string(),
            author_id: "A1".to_string(),
        }
    }

    fn student(code: &str, university: TenantId) -> Student {
        Student {
            code: code.to_string(),
            full_name: format!("Student {code}"),
            address: "Hanoi".to_string(),
            university,
            major: "Library Science".to_string(),
            borrow_count: 0,
        }
    }

    fn employee(code: &str) -> Employee {
        Employee {
            code: code.to_string(),
            full_name: format!("Employee {code}"),
            address: "Da Nang".to_string(),
            status: "active".to_string(),
            lib: "central".to_string(),
        }
    }

    fn borrow(book_code: &str, student_code: &str) -> Borrow {
        let date = Utc.with_ymd_and_hms(2024, 9, 1, 8, 0, 0).unwrap();
        Borrow {
            book_code: book_code.to_string(),
            student_code: student_code.to_string(),
            borrow_date: date,
            return_date: date,
        }
    }

    async fn with_author(service: &CatalogService) {
        service.create_author(author("A1", "X")).await.unwrap();
    }

    #[tokio::test]
    async fn author_round_trip() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);

        catalog.create_author(author("A1", "X")).await.unwrap();
        let found = catalog.find_author_by_code("A1").await.unwrap();

        assert_eq!(found.body.full_name, "X");
        assert!(catalog
            .registry()
            .is_connected(EntityKind::Author, TenantId::Universities));
        assert_eq!(catalog.open_connections(), 1);
    }

    #[tokio::test]
    async fn book_create_writes_tenant_and_aggregate() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);
        with_author(&catalog).await;

        let created = catalog.create_book(book("F001", 2019)).await.unwrap();

        let tenant = repo::<Book>(&catalog, TenantId::Fpt)
            .await
            .find_one(Filter::eq("code", "F001"))
            .await
            .unwrap()
            .unwrap();
        let aggregate = repo::<Book>(&catalog, TenantId::Universities)
            .await
            .find_one(Filter::eq("code", "F001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(created.id, tenant.id);
        assert_eq!(tenant.body, aggregate.body);

        catalog.delete_book("F001").await.unwrap();
        assert_eq!(
            repo::<Book>(&catalog, TenantId::Fpt).await.count(Filter::all()).await.unwrap(),
            0
        );
        assert_eq!(
            repo::<Book>(&catalog, TenantId::Universities)
                .await
                .count(Filter::all())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn book_create_requires_author() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);

        let result = catalog.create_book(book("F001", 2019)).await;

        assert!(matches!(result, Err(CatalogError::AuthorNotFound(code)) if code == "A1"));
        assert!(!catalog.registry().is_connected(EntityKind::Book, TenantId::Fpt));
        assert!(!catalog
            .registry()
            .is_connected(EntityKind::Book, TenantId::Universities));
    }

    #[tokio::test]
    async fn update_is_partial_in_both_databases() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);
        with_author(&catalog).await;
        let original = catalog.create_book(book("F001", 2019)).await.unwrap();

        let patch = BookPatch {
            year: Some(2020),
            ..BookPatch::default()
        };
        let updated = catalog.update_book("F001", patch).await.unwrap();
        assert_eq!(updated.body.year, 2020);

        for tenant in [TenantId::Fpt, TenantId::Universities] {
            let stored = repo::<Book>(&catalog, tenant)
                .await
                .find_one(Filter::eq("code", "F001"))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(stored.body.year, 2020);
            assert_eq!(stored.body.title, original.body.title);
            assert_eq!(stored.body.publisher, original.body.publisher);
            assert_eq!(stored.body.quantity, original.body.quantity);
        }
    }

    #[tokio::test]
    async fn update_of_missing_code_leaves_aggregate_alone() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);

        let result = catalog.update_book("F999", BookPatch::default()).await;

        assert!(matches!(
            result,
            Err(CatalogError::NotFound { kind: EntityKind::Book, ref key }) if key == "F999"
        ));
        assert!(!catalog
            .registry()
            .is_connected(EntityKind::Book, TenantId::Universities));
    }

    #[tokio::test]
    async fn invalid_book_update_is_rejected() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);
        with_author(&catalog).await;
        catalog.create_book(book("B7", 2001)).await.unwrap();

        let patch = BookPatch {
            year: Some(0),
            ..BookPatch::default()
        };
        let result = catalog.update_book("B7", patch).await;

        assert!(matches!(
            result,
            Err(CatalogError::Store(StoreError::Validation(_)))
        ));
        assert_eq!(catalog.find_book_by_code("B7").await.unwrap().body.year, 2001);
    }

    #[tokio::test]
    async fn second_delete_is_not_found() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);
        catalog.create_employee(employee("T5")).await.unwrap();

        catalog.delete_employee("T5").await.unwrap();
        let second = catalog.delete_employee("T5").await;

        assert!(matches!(second, Err(CatalogError::NotFound { .. })));
        assert!(!second.unwrap_err().is_connectivity());
    }

    #[tokio::test]
    async fn aggregate_drift_is_not_fatal() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);
        catalog.create_employee(employee("B3")).await.unwrap();
        repo::<Employee>(&catalog, TenantId::Universities)
            .await
            .find_one_and_delete(Filter::eq("code", "B3"))
            .await
            .unwrap();

        let patch = EmployeePatch {
            status: Some("retired".to_string()),
            ..EmployeePatch::default()
        };
        let updated = catalog.update_employee("B3", patch).await.unwrap();
        assert_eq!(updated.body.status, "retired");

        catalog.delete_employee("B3").await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_aggregate_only_fails_creates() {
        let dir = TempDir::new().unwrap();
        let endpoints = Endpoints::new("mongodb://unreachable/universities")
            .with_tenant(TenantId::Fpt, dir.path().join("fpt").display().to_string());
        let registry = Arc::new(ConnectionRegistry::new(Arc::new(RocksConnector), endpoints));
        let catalog = CatalogService::with_defaults(Arc::clone(&registry));

        repo::<Employee>(&catalog, TenantId::Fpt)
            .await
            .create(employee("F1"))
            .await
            .unwrap();

        let create = catalog.create_employee(employee("F2")).await;
        assert!(create.as_ref().is_err_and(CatalogError::is_connectivity));
        assert_eq!(
            repo::<Employee>(&catalog, TenantId::Fpt)
                .await
                .count(Filter::all())
                .await
                .unwrap(),
            1
        );

        let patch = EmployeePatch {
            address: Some("Hue".to_string()),
            ..EmployeePatch::default()
        };
        assert_eq!(
            catalog.update_employee("F1", patch).await.unwrap().body.address,
            "Hue"
        );
        catalog.delete_employee("F1").await.unwrap();
    }

    #[tokio::test]
    async fn failed_tenant_create_leaves_the_aggregate_copy() {
        let dir = TempDir::new().unwrap();
        let endpoints = StoreConfig::with_data_dir(dir.path())
            .endpoints()
            .with_tenant(TenantId::Fpt, "mongodb://down/fpt");
        let registry = Arc::new(ConnectionRegistry::new(Arc::new(RocksConnector), endpoints));
        let catalog = CatalogService::with_defaults(registry);

        let create = catalog.create_employee(employee("F1")).await;

        assert!(create.as_ref().is_err_and(CatalogError::is_connectivity));
        let aggregate = repo::<Employee>(&catalog, TenantId::Universities).await;
        assert_eq!(aggregate.count(Filter::all()).await.unwrap(), 1);
        assert!(!catalog
            .registry()
            .is_connected(EntityKind::Employee, TenantId::Fpt));
    }

    #[tokio::test]
    async fn unmatched_codes_are_written_once_to_the_aggregate() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);

        catalog.create_employee(employee("Z1")).await.unwrap();

        let aggregate = repo::<Employee>(&catalog, TenantId::Universities).await;
        assert_eq!(aggregate.count(Filter::all()).await.unwrap(), 1);
        assert_eq!(catalog.find_employee_by_code("Z1").await.unwrap().body.code, "Z1");
    }

    #[tokio::test]
    async fn duplicate_codes_conflict() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);
        catalog.create_author(author("A1", "X")).await.unwrap();

        let result = catalog.create_author(author("A1", "Y")).await;

        assert_eq!(result.unwrap_err().http_status_code(), 409);
    }

    #[tokio::test]
    async fn list_pages_and_sorts() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);
        with_author(&catalog).await;
        for (code, year) in [("B1", 2003), ("B2", 2001), ("F3", 2005), ("T4", 2002), ("B5", 2004)] {
            catalog.create_book(book(code, year)).await.unwrap();
        }

        let page = catalog
            .list_books(ListQuery::default().page(2, 2).sort("year", SortOrder::Desc))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!((page.page, page.limit), (2, 2));
        let years: Vec<_> = page.items.iter().map(|r| r.body.year).collect();
        assert_eq!(years, vec![2003, 2002]);

        let ctu = catalog
            .list_books(ListQuery::default().tenant(TenantId::Ctu))
            .await
            .unwrap();
        assert_eq!(ctu.total, 3);
        assert_eq!((ctu.page, ctu.limit), (1, 20));
    }

    #[tokio::test]
    async fn books_populate_their_author() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);
        with_author(&catalog).await;
        catalog.create_book(book("T1", 1999)).await.unwrap();

        let single = catalog.find_book_with_author("T1").await.unwrap();
        assert_eq!(single.related.unwrap().body.full_name, "X");

        let page = catalog
            .list_books_with_author(ListQuery::default())
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(page.items[0].related.is_some());
    }

    #[tokio::test]
    async fn unified_students_mirror_by_university() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);

        catalog
            .create_student(student("F20", TenantId::Fpt))
            .await
            .unwrap();

        let everyone = catalog.list_students(ListQuery::default()).await.unwrap();
        let fpt = catalog
            .list_students(ListQuery::default().tenant(TenantId::Fpt))
            .await
            .unwrap();
        assert_eq!(everyone.total, 1);
        assert_eq!(fpt.total, 1);
    }

    #[tokio::test]
    async fn student_codes_repeat_across_institutions() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);

        catalog
            .create_student(student("S1", TenantId::Ctu))
            .await
            .unwrap();
        catalog
            .create_student(student("S1", TenantId::Fpt))
            .await
            .unwrap();

        for tenant in [TenantId::Ctu, TenantId::Fpt] {
            let page = catalog
                .list_students(ListQuery::default().tenant(tenant))
                .await
                .unwrap();
            assert_eq!(page.total, 1);
        }
        let everyone = catalog.list_students(ListQuery::default()).await.unwrap();
        assert_eq!(everyone.total, 2);

        let duplicate = catalog.create_student(student("S1", TenantId::Fpt)).await;
        assert_eq!(duplicate.unwrap_err().http_status_code(), 409);
        let aggregate = repo::<Student>(&catalog, TenantId::Universities).await;
        assert_eq!(aggregate.count(Filter::all()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn student_mirror_legs_follow_the_university() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);
        catalog
            .create_student(student("F20", TenantId::Ctu))
            .await
            .unwrap();
        catalog
            .create_student(student("F20", TenantId::Fpt))
            .await
            .unwrap();

        let patch = StudentPatch {
            major: Some("Law".to_string()),
            ..StudentPatch::default()
        };
        catalog.update_student("F20", patch).await.unwrap();

        let aggregate = repo::<Student>(&catalog, TenantId::Universities).await;
        let ctu_copy = Filter::eq("code", "F20").and("university", "ctu");
        let fpt_copy = Filter::eq("code", "F20").and("university", "fpt");
        let ctu = aggregate.find_one(ctu_copy.clone()).await.unwrap().unwrap();
        let fpt = aggregate.find_one(fpt_copy.clone()).await.unwrap().unwrap();
        assert_eq!(ctu.body.major, "Library Science");
        assert_eq!(fpt.body.major, "Law");

        catalog.delete_student("F20").await.unwrap();

        assert!(aggregate.find_one(fpt_copy).await.unwrap().is_none());
        assert!(aggregate.find_one(ctu_copy).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn legacy_students_stay_in_their_tenant() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Legacy);

        catalog
            .create_student(student("B20", TenantId::Ctu))
            .await
            .unwrap();
        catalog
            .create_student(student("T21", TenantId::Tdu))
            .await
            .unwrap();

        assert!(!catalog
            .registry()
            .is_connected(EntityKind::Student, TenantId::Universities));

        let default_list = catalog.list_students(ListQuery::default()).await.unwrap();
        assert_eq!(default_list.total, 1);
        assert_eq!(default_list.items[0].body.code, "B20");

        let tdu = catalog
            .list_students(ListQuery::default().tenant(TenantId::Tdu))
            .await
            .unwrap();
        assert_eq!(tdu.items[0].body.code, "T21");
    }

    #[tokio::test]
    async fn students_reject_the_aggregate_as_university() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);

        let result = catalog
            .create_student(student("B1", TenantId::Universities))
            .await;

        assert_eq!(result.unwrap_err().http_status_code(), 400);
    }

    #[tokio::test]
    async fn loans_route_by_student() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Unified);
        catalog.create_borrow(borrow("B1", "T10")).await.unwrap();
        catalog.create_borrow(borrow("B1", "T10")).await.unwrap();

        let tdu = repo::<Borrow>(&catalog, TenantId::Tdu).await;
        assert_eq!(tdu.count(Filter::all()).await.unwrap(), 2);

        let key = LoanKey::new("B1", "T10");
        let later = Utc.with_ymd_and_hms(2024, 10, 1, 8, 0, 0).unwrap();
        let patch = BorrowPatch {
            return_date: Some(later),
            ..BorrowPatch::default()
        };
        let updated = catalog.update_borrow(&key, patch).await.unwrap();
        assert_eq!(updated.body.return_date, later);

        let found = catalog.find_borrow(&key).await.unwrap();
        assert_eq!(found.id, updated.id);

        catalog.delete_borrow(&key).await.unwrap();
        catalog.delete_borrow(&key).await.unwrap();
        assert!(matches!(
            catalog.find_borrow(&key).await,
            Err(CatalogError::NotFound { kind: EntityKind::Borrow, .. })
        ));
    }

    #[tokio::test]
    async fn legacy_loans_fall_back_to_tdu() {
        let (catalog, _dir) = create_test_catalog(PolicyMode::Legacy);

        catalog.create_borrow(borrow("B1", "X10")).await.unwrap();

        let tdu = repo::<Borrow>(&catalog, TenantId::Tdu).await;
        assert_eq!(tdu.count(Filter::all()).await.unwrap(), 1);
        assert!(!catalog
            .registry()
            .is_connected(EntityKind::Borrow, TenantId::Universities));
    }
}
