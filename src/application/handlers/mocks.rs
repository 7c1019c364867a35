//! In-memory port implementations shared by the handler test modules.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::commerce::{
    GatewayOrderStatus, Invoice, InvoiceStatus, Payment, PaymentStatus, PricingPlan,
    PurchaseTarget, SettlementDetails, UserSubscription,
};
use crate::domain::foundation::{
    CourseId, DomainError, ErrorCode, InvoiceId, PaymentId, PricingPlanId, SubjectId, Timestamp,
    UserId,
};
use crate::ports::{
    CatalogReader, CreateInvoiceRequest, CreateOrderRequest, GatewayClient, GatewayError,
    GatewayOrder, GatewayOrderSnapshot, InvoiceLedger, InvoiceWithPayment, PaymentRepository,
    SubscriptionRepository,
};

// ════════════════════════════════════════════════════════════════════════════
// Catalog
// ════════════════════════════════════════════════════════════════════════════

pub struct MockCatalogReader {
    pub plans: Mutex<Vec<PricingPlan>>,
    pub courses: Mutex<HashMap<CourseId, Vec<SubjectId>>>,
    pub subjects: Mutex<Vec<SubjectId>>,
}

impl MockCatalogReader {
    pub fn new() -> Self {
        Self {
            plans: Mutex::new(Vec::new()),
            courses: Mutex::new(HashMap::new()),
            subjects: Mutex::new(Vec::new()),
        }
    }

    pub fn with_plan(self, plan: PricingPlan) -> Self {
        self.plans.lock().unwrap().push(plan);
        self
    }

    pub fn with_course(self, course_id: CourseId, subjects: Vec<SubjectId>) -> Self {
        self.subjects.lock().unwrap().extend(subjects.iter().copied());
        self.courses.lock().unwrap().insert(course_id, subjects);
        self
    }

    pub fn with_subject(self, subject_id: SubjectId) -> Self {
        self.subjects.lock().unwrap().push(subject_id);
        self
    }
}

#[async_trait]
impl CatalogReader for MockCatalogReader {
    async fn find_pricing_plan(
        &self,
        id: &PricingPlanId,
    ) -> Result<Option<PricingPlan>, DomainError> {
        Ok(self.plans.lock().unwrap().iter().find(|p| &p.id == id).cloned())
    }

    async fn course_subjects(&self, course_id: &CourseId) -> Result<Vec<SubjectId>, DomainError> {
        Ok(self
            .courses
            .lock()
            .unwrap()
            .get(course_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn course_exists(&self, course_id: &CourseId) -> Result<bool, DomainError> {
        Ok(self.courses.lock().unwrap().contains_key(course_id))
    }

    async fn subject_exists(&self, subject_id: &SubjectId) -> Result<bool, DomainError> {
        Ok(self.subjects.lock().unwrap().contains(subject_id))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Invoice Ledger + Payment Repository (shared store)
// ════════════════════════════════════════════════════════════════════════════

pub struct MockLedger {
    pub invoices: Mutex<Vec<Invoice>>,
    pub payments: Mutex<Vec<Payment>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            invoices: Mutex::new(Vec::new()),
            payments: Mutex::new(Vec::new()),
        }
    }

    pub fn with_records(invoice: Invoice, payment: Payment) -> Self {
        Self {
            invoices: Mutex::new(vec![invoice]),
            payments: Mutex::new(vec![payment]),
        }
    }

    pub fn invoice(&self, id: &InvoiceId) -> Invoice {
        self.invoices
            .lock()
            .unwrap()
            .iter()
            .find(|i| &i.id == id)
            .cloned()
            .unwrap()
    }

    pub fn payment_by_reference(&self, reference: &str) -> Option<Payment> {
        self.payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.payment_reference == reference)
            .cloned()
    }
}

#[async_trait]
impl InvoiceLedger for MockLedger {
    async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceWithPayment, DomainError> {
        let now = Timestamp::now();
        let total = request.line_items.iter().map(|li| li.amount_minor).sum();
        let invoice = Invoice {
            id: InvoiceId::new(),
            customer_id: request.customer_id,
            org_id: request.org_id,
            target: request.target,
            total_minor: total,
            currency: request.currency.clone(),
            status: InvoiceStatus::Pending,
            line_items: request.line_items,
            status_reason: None,
            settlement: None,
            created_at: now,
            updated_at: now,
        };
        let payment = Payment {
            id: PaymentId::new(),
            invoice_id: invoice.id,
            payment_reference: request.payment_reference,
            gateway_transaction_id: None,
            gateway_session_token: None,
            amount_minor: total,
            currency: request.currency,
            status: PaymentStatus::Pending,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.invoices.lock().unwrap().push(invoice.clone());
        self.payments.lock().unwrap().push(payment.clone());
        Ok(InvoiceWithPayment { invoice, payment })
    }

    async fn mark_paid(
        &self,
        id: &InvoiceId,
        settlement: SettlementDetails,
    ) -> Result<Invoice, DomainError> {
        let invoice = self.transition(id, InvoiceStatus::Paid, None)?;
        let mut invoices = self.invoices.lock().unwrap();
        let stored = invoices.iter_mut().find(|i| &i.id == id).unwrap();
        if stored.settlement.is_none() {
            stored.settlement = Some(settlement);
        }
        Ok(Invoice {
            settlement: stored.settlement.clone(),
            ..invoice
        })
    }

    async fn reopen(&self, id: &InvoiceId) -> Result<Invoice, DomainError> {
        let mut invoices = self.invoices.lock().unwrap();
        let invoice = invoices
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::InvoiceNotFound, id.to_string()))?;
        match invoice.status {
            InvoiceStatus::Failed | InvoiceStatus::Cancelled => {
                invoice.status = InvoiceStatus::Pending;
                invoice.status_reason = None;
                invoice.updated_at = Timestamp::now();
                Ok(invoice.clone())
            }
            InvoiceStatus::Draft | InvoiceStatus::Pending => Ok(invoice.clone()),
            InvoiceStatus::Paid => Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "invoice is PAID".to_string(),
            )),
        }
    }

    async fn mark_failed(&self, id: &InvoiceId, reason: &str) -> Result<Invoice, DomainError> {
        self.transition(id, InvoiceStatus::Failed, Some(reason.to_string()))
    }

    async fn mark_cancelled(&self, id: &InvoiceId, reason: &str) -> Result<Invoice, DomainError> {
        self.transition(id, InvoiceStatus::Cancelled, Some(reason.to_string()))
    }

    async fn find_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        Ok(self.invoices.lock().unwrap().iter().find(|i| &i.id == id).cloned())
    }

    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Invoice>, DomainError> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .filter(|i| &i.customer_id == customer_id)
            .cloned()
            .collect())
    }
}

impl MockLedger {
    fn transition(
        &self,
        id: &InvoiceId,
        status: InvoiceStatus,
        reason: Option<String>,
    ) -> Result<Invoice, DomainError> {
        let mut invoices = self.invoices.lock().unwrap();
        let invoice = invoices
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::InvoiceNotFound, id.to_string()))?;
        if invoice.status == status {
            return Ok(invoice.clone());
        }
        if invoice.status.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("invoice is {}", invoice.status.as_str()),
            ));
        }
        invoice.status = status;
        invoice.status_reason = reason;
        invoice.updated_at = Timestamp::now();
        Ok(invoice.clone())
    }
}

#[async_trait]
impl PaymentRepository for MockLedger {
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, DomainError> {
        Ok(self.payment_by_reference(reference))
    }

    async fn find_by_invoice(
        &self,
        invoice_id: &InvoiceId,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| &p.invoice_id == invoice_id)
            .cloned())
    }

    async fn update(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.lock().unwrap();
        let existing = payments
            .iter_mut()
            .find(|p| p.id == payment.id)
            .ok_or_else(|| DomainError::new(ErrorCode::PaymentNotFound, payment.id.to_string()))?;
        *existing = payment.clone();
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Subscription Repository
// ════════════════════════════════════════════════════════════════════════════

pub struct MockSubscriptionRepository {
    pub subscriptions: Mutex<Vec<UserSubscription>>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_subscription(subscription: UserSubscription) -> Self {
        Self {
            subscriptions: Mutex::new(vec![subscription]),
        }
    }

    pub fn all(&self) -> Vec<UserSubscription> {
        self.subscriptions.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn save(&self, subscription: &UserSubscription) -> Result<(), DomainError> {
        self.subscriptions.lock().unwrap().push(subscription.clone());
        Ok(())
    }

    async fn find_by_gateway_keys(
        &self,
        gateway_order_id: Option<&str>,
        transaction_id: Option<&str>,
    ) -> Result<Option<UserSubscription>, DomainError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.matches_gateway_keys(gateway_order_id, transaction_id))
            .cloned())
    }

    async fn find_active_covering(
        &self,
        user_id: &UserId,
        target: &PurchaseTarget,
    ) -> Result<Option<UserSubscription>, DomainError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| &s.user_id == user_id)
            .find(|s| match target {
                PurchaseTarget::Course(course_id) => s.covers_course(course_id),
                PurchaseTarget::Subject(subject_id) => s.covers_subject(subject_id),
            })
            .cloned())
    }

    async fn list_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<UserSubscription>, DomainError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|s| &s.user_id == user_id && s.is_active())
            .cloned()
            .collect())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Gateway
// ════════════════════════════════════════════════════════════════════════════

pub struct MockGatewayClient {
    pub created_orders: Mutex<Vec<CreateOrderRequest>>,
    pub snapshot: Mutex<Option<GatewayOrderSnapshot>>,
    pub fail_create: bool,
    pub fail_status: bool,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self {
            created_orders: Mutex::new(Vec::new()),
            snapshot: Mutex::new(None),
            fail_create: false,
            fail_status: false,
        }
    }

    pub fn with_status(status: GatewayOrderStatus) -> Self {
        let client = Self::new();
        *client.snapshot.lock().unwrap() = Some(GatewayOrderSnapshot {
            order_status: status,
            session_token: None,
            transaction_id: None,
            failure_reason: None,
        });
        client
    }

    pub fn with_snapshot(snapshot: GatewayOrderSnapshot) -> Self {
        let client = Self::new();
        *client.snapshot.lock().unwrap() = Some(snapshot);
        client
    }

    pub fn unreachable() -> Self {
        Self {
            created_orders: Mutex::new(Vec::new()),
            snapshot: Mutex::new(None),
            fail_create: true,
            fail_status: true,
        }
    }

    pub fn created(&self) -> Vec<CreateOrderRequest> {
        self.created_orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<GatewayOrder, GatewayError> {
        if self.fail_create {
            return Err(GatewayError::network("connect timeout"));
        }
        let order_id = request.order_id.clone();
        self.created_orders.lock().unwrap().push(request);
        Ok(GatewayOrder {
            order_id,
            session_token: Some("session_mock".to_string()),
        })
    }

    async fn get_order_status(
        &self,
        _order_id: &str,
    ) -> Result<Option<GatewayOrderSnapshot>, GatewayError> {
        if self.fail_status {
            return Err(GatewayError::network("connect timeout"));
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }
}
