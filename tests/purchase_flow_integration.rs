//! Integration tests for the purchase lifecycle.
//!
//! These tests verify the end-to-end flow:
//! 1. StartPurchaseHandler opens an invoice and a gateway order
//! 2. ProcessWebhookHandler records the payment and grants the subscription
//! 3. ResolveOrderHandler merges gateway and ledger state
//! 4. ResumeOrderHandler reuses, remints, or self-heals the order
//! 5. CancelOrderHandler closes unfinished orders idempotently
//!
//! Uses in-memory adapters to exercise the handlers without external
//! dependencies; webhook signatures are real HMAC-SHA256 digests.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use serde_json::json;
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use coursepay::adapters::gateway::MockGatewayClient;
use coursepay::application::handlers::commerce::{
    CancelOrderCommand, CancelOrderHandler, CancelOrderResult, GrantSubscriptionHandler,
    ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult, ResolveOrderCommand,
    ResolveOrderHandler, ResumeOrderCommand, ResumeOrderHandler, ResumeOrderResult,
    StartPurchaseCommand, StartPurchaseHandler, StartPurchaseResult,
};
use coursepay::domain::commerce::{
    CommerceError, Invoice, InvoiceStatus, Payment, PaymentStatus, PricingPlan, PurchaseTarget,
    RawWebhookEnvelope, ResolvedOrderStatus, SettlementDetails, UserSubscription, WebhookVerifier,
};
use coursepay::domain::foundation::{
    CourseId, DomainError, ErrorCode, InvoiceId, OrgId, PaymentId, PricingPlanId, SubjectId,
    Timestamp, UserId,
};
use coursepay::ports::{
    CatalogReader, CreateInvoiceRequest, CustomerDetails, InvoiceLedger, InvoiceWithPayment,
    PaymentRepository, SubscriptionRepository,
};

type HmacSha256 = Hmac<Sha256>;

const WEBHOOK_SECRET: &str = "integration_test_secret";

// =============================================================================
// Test Infrastructure
// =============================================================================

/// In-memory ledger holding invoices together with their payments.
#[derive(Default)]
struct InMemoryLedger {
    invoices: Mutex<Vec<Invoice>>,
    payments: Mutex<Vec<Payment>>,
}

impl InMemoryLedger {
    fn new() -> Self {
        Self::default()
    }

    fn invoice(&self, id: &InvoiceId) -> Invoice {
        self.invoices
            .lock()
            .unwrap()
            .iter()
            .find(|i| &i.id == id)
            .cloned()
            .expect("invoice exists")
    }

    fn payment_by_reference(&self, reference: &str) -> Option<Payment> {
        self.payments
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.payment_reference == reference)
            .cloned()
    }

    fn transition(&self, id: &InvoiceId, to: InvoiceStatus, reason: Option<&str>) -> Result<Invoice, DomainError> {
        let mut invoices = self.invoices.lock().unwrap();
        let invoice = invoices
            .iter_mut()
            .find(|i| &i.id == id)
            .ok_or_else(|| DomainError::new(ErrorCode::InvoiceNotFound, id.to_string()))?;
        if invoice.status == to {
            return Ok(invoice.clone());
        }
        if invoice.status.is_terminal() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("invoice is {}", invoice.status.as_str()),
            ));
        }
        invoice.status = to;
        invoice.status_reason = reason.map(String::from);
        invoice.updated_at = Timestamp::now();
        Ok(invoice.clone())
    }
}

#[async_trait]
impl InvoiceLedger for InMemoryLedger {
    async fn create_invoice(
        &self,
        request: CreateInvoiceRequest,
    ) -> Result<InvoiceWithPayment, DomainError> {
        let now = Timestamp::now();
        let total: i64 = request.line_items.iter().map(|li| li.amount_minor).sum();
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
        self.transition(id, InvoiceStatus::Paid, None)?;
        let mut invoices = self.invoices.lock().unwrap();
        let invoice = invoices.iter_mut().find(|i| &i.id == id).unwrap();
        if invoice.settlement.is_none() {
            invoice.settlement = Some(settlement);
        }
        Ok(invoice.clone())
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
        self.transition(id, InvoiceStatus::Failed, Some(reason))
    }

    async fn mark_cancelled(&self, id: &InvoiceId, reason: &str) -> Result<Invoice, DomainError> {
        self.transition(id, InvoiceStatus::Cancelled, Some(reason))
    }

    async fn find_invoice(&self, id: &InvoiceId) -> Result<Option<Invoice>, DomainError> {
        Ok(self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .find(|i| &i.id == id)
            .cloned())
    }

    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Invoice>, DomainError> {
        let mut invoices: Vec<Invoice> = self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .filter(|i| &i.customer_id == customer_id)
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.created_at.as_datetime().cmp(&a.created_at.as_datetime()));
        Ok(invoices)
    }
}

#[async_trait]
impl PaymentRepository for InMemoryLedger {
    async fn find_by_reference(&self, reference: &str) -> Result<Option<Payment>, DomainError> {
        Ok(self.payment_by_reference(reference))
    }

    async fn find_by_invoice(&self, invoice_id: &InvoiceId) -> Result<Option<Payment>, DomainError> {
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

/// In-memory catalog with one course and its subjects.
struct InMemoryCatalog {
    plans: Vec<PricingPlan>,
    courses: HashMap<CourseId, Vec<SubjectId>>,
    subjects: Vec<SubjectId>,
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn find_pricing_plan(
        &self,
        id: &PricingPlanId,
    ) -> Result<Option<PricingPlan>, DomainError> {
        Ok(self.plans.iter().find(|p| &p.id == id).cloned())
    }

    async fn course_subjects(&self, course_id: &CourseId) -> Result<Vec<SubjectId>, DomainError> {
        Ok(self.courses.get(course_id).cloned().unwrap_or_default())
    }

    async fn course_exists(&self, course_id: &CourseId) -> Result<bool, DomainError> {
        Ok(self.courses.contains_key(course_id))
    }

    async fn subject_exists(&self, subject_id: &SubjectId) -> Result<bool, DomainError> {
        Ok(self.subjects.contains(subject_id))
    }
}

/// In-memory subscription store.
#[derive(Default)]
struct InMemorySubscriptions {
    subscriptions: Mutex<Vec<UserSubscription>>,
}

impl InMemorySubscriptions {
    fn all(&self) -> Vec<UserSubscription> {
        self.subscriptions.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptions {
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
            .find(|s| {
                &s.user_id == user_id
                    && match target {
                        PurchaseTarget::Course(course_id) => s.covers_course(course_id),
                        PurchaseTarget::Subject(subject_id) => s.covers_subject(subject_id),
                    }
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

// =============================================================================
// Test Harness
// =============================================================================

struct TestApp {
    ledger: Arc<InMemoryLedger>,
    subscriptions: Arc<InMemorySubscriptions>,
    gateway: Arc<MockGatewayClient>,
    start_purchase: StartPurchaseHandler,
    process_webhook: ProcessWebhookHandler,
    resolve_order: ResolveOrderHandler,
    resume_order: ResumeOrderHandler,
    cancel_order: CancelOrderHandler,
    user_id: UserId,
    course_id: CourseId,
    subject_ids: Vec<SubjectId>,
    plan_id: PricingPlanId,
}

impl TestApp {
    fn new() -> Self {
        let user_id = UserId::new();
        let course_id = CourseId::new();
        let subject_ids = vec![SubjectId::new(), SubjectId::new(), SubjectId::new()];
        let plan_id = PricingPlanId::new();

        let catalog = Arc::new(InMemoryCatalog {
            plans: vec![PricingPlan {
                id: plan_id,
                target: PurchaseTarget::Course(course_id),
                name: "Physics Foundation".to_string(),
                amount_minor: 49900,
            }],
            courses: HashMap::from([(course_id, subject_ids.clone())]),
            subjects: subject_ids.clone(),
        });
        let ledger = Arc::new(InMemoryLedger::new());
        let subscriptions = Arc::new(InMemorySubscriptions::default());
        let gateway = Arc::new(MockGatewayClient::new());
        let verifier = Arc::new(WebhookVerifier::new(
            SecretString::new(WEBHOOK_SECRET.to_string()),
            false,
        ));
        let grants = Arc::new(GrantSubscriptionHandler::new(
            subscriptions.clone(),
            catalog.clone(),
        ));

        let start_purchase = StartPurchaseHandler::new(
            catalog.clone(),
            subscriptions.clone(),
            ledger.clone(),
            ledger.clone(),
            gateway.clone(),
        );
        let process_webhook = ProcessWebhookHandler::new(
            verifier,
            ledger.clone(),
            ledger.clone(),
            grants.clone(),
        );
        let resolve_order =
            ResolveOrderHandler::new(ledger.clone(), ledger.clone(), gateway.clone());
        let resume_order = ResumeOrderHandler::new(
            ledger.clone(),
            ledger.clone(),
            gateway.clone(),
            grants,
        );
        let cancel_order = CancelOrderHandler::new(ledger.clone(), ledger.clone());

        Self {
            ledger,
            subscriptions,
            gateway,
            start_purchase,
            process_webhook,
            resolve_order,
            resume_order,
            cancel_order,
            user_id,
            course_id,
            subject_ids,
            plan_id,
        }
    }

    async fn begin_purchase(&self) -> StartPurchaseResult {
        self.start_purchase
            .handle(StartPurchaseCommand {
                user_id: self.user_id,
                org_id: Some(OrgId::new()),
                pricing_plan_id: self.plan_id,
                customer: customer(),
                currency: "INR".to_string(),
            })
            .await
            .expect("purchase starts")
    }

    async fn deliver_webhook(
        &self,
        body: serde_json::Value,
    ) -> Result<ProcessWebhookResult, CommerceError> {
        let raw = body.to_string().into_bytes();
        let timestamp = Timestamp::now().as_unix_secs().to_string();
        let signature = sign(&timestamp, &raw);
        self.process_webhook
            .handle(ProcessWebhookCommand {
                envelope: RawWebhookEnvelope {
                    signature: Some(signature),
                    timestamp: Some(timestamp),
                    parsed_body: None,
                    raw_body: raw,
                },
            })
            .await
    }
}

fn customer() -> CustomerDetails {
    CustomerDetails {
        name: Some("Asha".to_string()),
        email: Some("asha@example.com".to_string()),
        phone: None,
    }
}

fn sign(timestamp: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn success_webhook(order_id: &str, transaction_id: u64) -> serde_json::Value {
    json!({
        "type": "PAYMENT_SUCCESS_WEBHOOK",
        "data": {
            "order": {"order_id": order_id},
            "payment": {
                "cf_payment_id": transaction_id,
                "payment_method": {"upi": {"upi_id": "asha@bank"}}
            }
        }
    })
}

fn failed_webhook(order_id: &str) -> serde_json::Value {
    json!({
        "type": "PAYMENT_FAILED_WEBHOOK",
        "data": {
            "order": {"order_id": order_id},
            "payment": {"payment_message": "insufficient funds"}
        }
    })
}

// =============================================================================
// End-to-End Flow
// =============================================================================

#[tokio::test]
async fn purchase_webhook_grant_end_to_end() {
    let app = TestApp::new();

    let purchase = app.begin_purchase().await;
    assert!(purchase.gateway_session_token.is_some());
    assert_eq!(purchase.amount_minor, 49900);

    let result = app
        .deliver_webhook(success_webhook(&purchase.order_id, 9001))
        .await
        .unwrap();
    let newly_granted = match result {
        ProcessWebhookResult::PaymentRecorded { newly_granted, .. } => newly_granted,
        other => panic!("expected PaymentRecorded, got {:?}", other),
    };
    assert!(newly_granted);

    // Ledger reflects the payment
    assert_eq!(app.ledger.invoice(&purchase.invoice_id).status, InvoiceStatus::Paid);
    let payment = app.ledger.payment_by_reference(&purchase.order_id).unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    assert_eq!(payment.gateway_transaction_id.as_deref(), Some("9001"));

    // Course purchase expands to the full subject set
    let subs = app.subscriptions.all();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].course_id, Some(app.course_id));
    assert_eq!(subs[0].subject_ids, app.subject_ids);
    assert_eq!(subs[0].gateway_order_id.as_deref(), Some(purchase.order_id.as_str()));
}

#[tokio::test]
async fn webhook_replay_grants_exactly_once() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;

    // At-least-once delivery: the same event arrives three times
    for _ in 0..3 {
        app.deliver_webhook(success_webhook(&purchase.order_id, 9001))
            .await
            .unwrap();
    }

    assert_eq!(app.subscriptions.all().len(), 1);
    assert_eq!(app.ledger.invoice(&purchase.invoice_id).status, InvoiceStatus::Paid);
}

#[tokio::test]
async fn tampered_webhook_is_rejected() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;

    let raw = success_webhook(&purchase.order_id, 9001).to_string().into_bytes();
    let timestamp = Timestamp::now().as_unix_secs().to_string();
    let result = app
        .process_webhook
        .handle(ProcessWebhookCommand {
            envelope: RawWebhookEnvelope {
                signature: Some(sign(&timestamp, b"different body")),
                timestamp: Some(timestamp),
                parsed_body: None,
                raw_body: raw,
            },
        })
        .await;

    assert!(matches!(result, Err(CommerceError::InvalidSignature(_))));
    assert!(app.subscriptions.all().is_empty());
}

#[tokio::test]
async fn failed_webhook_marks_invoice_failed() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;

    let result = app
        .deliver_webhook(failed_webhook(&purchase.order_id))
        .await
        .unwrap();
    assert!(matches!(result, ProcessWebhookResult::PaymentFailed { .. }));

    assert_eq!(app.ledger.invoice(&purchase.invoice_id).status, InvoiceStatus::Failed);
    let payment = app.ledger.payment_by_reference(&purchase.order_id).unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert_eq!(payment.failure_reason.as_deref(), Some("insufficient funds"));
    assert!(app.subscriptions.all().is_empty());
}

// =============================================================================
// Status Resolution
// =============================================================================

#[tokio::test]
async fn resolution_prefers_live_gateway_state() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;

    // Local ledger still PENDING
    let status = app
        .resolve_order
        .handle(ResolveOrderCommand {
            order_id: purchase.order_id.clone(),
        })
        .await
        .unwrap();
    assert_eq!(status.status, ResolvedOrderStatus::Pending);

    // Gateway settles before any webhook arrives
    app.gateway.settle_order(&purchase.order_id, "txn_live");
    let status = app
        .resolve_order
        .handle(ResolveOrderCommand {
            order_id: purchase.order_id.clone(),
        })
        .await
        .unwrap();
    assert_eq!(status.status, ResolvedOrderStatus::Success);
    assert_eq!(status.item_name.as_deref(), Some("Physics Foundation"));
}

#[tokio::test]
async fn resolution_degrades_to_ledger_when_gateway_unreachable() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;
    app.deliver_webhook(success_webhook(&purchase.order_id, 9001))
        .await
        .unwrap();

    app.gateway
        .set_error(coursepay::ports::GatewayError::network("connect timeout"));
    let status = app
        .resolve_order
        .handle(ResolveOrderCommand {
            order_id: purchase.order_id.clone(),
        })
        .await
        .unwrap();

    assert_eq!(status.status, ResolvedOrderStatus::Success);
    assert!(status.gateway_status.is_none());
}

// =============================================================================
// Resume
// =============================================================================

#[tokio::test]
async fn resume_reuses_open_checkout_session() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;

    let result = app
        .resume_order
        .handle(ResumeOrderCommand {
            order_id: purchase.order_id.clone(),
            user_id: app.user_id,
            customer: customer(),
        })
        .await
        .unwrap();

    match result {
        ResumeOrderResult::ReuseSession { order_id, gateway_session_token } => {
            assert_eq!(order_id, purchase.order_id);
            assert!(gateway_session_token.is_some());
        }
        other => panic!("expected ReuseSession, got {:?}", other),
    }
}

#[tokio::test]
async fn resume_remints_order_when_session_is_dead() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;

    app.gateway.set_snapshot(
        purchase.order_id.clone(),
        coursepay::ports::GatewayOrderSnapshot {
            order_status: coursepay::domain::commerce::GatewayOrderStatus::Expired,
            session_token: None,
            transaction_id: None,
            failure_reason: None,
        },
    );

    let result = app
        .resume_order
        .handle(ResumeOrderCommand {
            order_id: purchase.order_id.clone(),
            user_id: app.user_id,
            customer: customer(),
        })
        .await
        .unwrap();

    let new_order_id = match result {
        ResumeOrderResult::NewOrder { order_id, gateway_session_token } => {
            assert!(gateway_session_token.is_some());
            order_id
        }
        other => panic!("expected NewOrder, got {:?}", other),
    };
    assert_ne!(new_order_id, purchase.order_id);

    // The payment row now answers to the new reference only
    assert!(app.ledger.payment_by_reference(&purchase.order_id).is_none());
    let payment = app.ledger.payment_by_reference(&new_order_id).unwrap();
    assert_eq!(payment.invoice_id, purchase.invoice_id);

    let result = app
        .resolve_order
        .handle(ResolveOrderCommand {
            order_id: purchase.order_id.clone(),
        })
        .await;
    assert!(matches!(result, Err(CommerceError::OrderNotFound(_))));
}

#[tokio::test]
async fn retry_after_failed_payment_completes_the_purchase() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;

    // First attempt fails: the gateway tells us, the invoice closes
    app.deliver_webhook(failed_webhook(&purchase.order_id))
        .await
        .unwrap();
    assert_eq!(
        app.ledger.invoice(&purchase.invoice_id).status,
        InvoiceStatus::Failed
    );
    app.gateway.set_snapshot(
        purchase.order_id.clone(),
        coursepay::ports::GatewayOrderSnapshot {
            order_status: coursepay::domain::commerce::GatewayOrderStatus::Failed,
            session_token: None,
            transaction_id: None,
            failure_reason: Some("insufficient funds".to_string()),
        },
    );

    // The user retries: a fresh order supersedes the dead one and the
    // invoice reopens so the next settlement can land
    let result = app
        .resume_order
        .handle(ResumeOrderCommand {
            order_id: purchase.order_id.clone(),
            user_id: app.user_id,
            customer: customer(),
        })
        .await
        .unwrap();
    let new_order_id = match result {
        ResumeOrderResult::NewOrder { order_id, .. } => order_id,
        other => panic!("expected NewOrder, got {:?}", other),
    };
    assert_eq!(
        app.ledger.invoice(&purchase.invoice_id).status,
        InvoiceStatus::Pending
    );

    // Second attempt succeeds and the grant goes through
    let result = app
        .deliver_webhook(success_webhook(&new_order_id, 9010))
        .await
        .unwrap();
    let newly_granted = match result {
        ProcessWebhookResult::PaymentRecorded { newly_granted, .. } => newly_granted,
        other => panic!("expected PaymentRecorded, got {:?}", other),
    };
    assert!(newly_granted);

    let invoice = app.ledger.invoice(&purchase.invoice_id);
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert_eq!(
        invoice.settlement.as_ref().unwrap().transaction_id.as_deref(),
        Some("9010")
    );
    assert_eq!(app.subscriptions.all().len(), 1);
}

#[tokio::test]
async fn resume_self_heals_paid_order_missed_by_webhooks() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;

    // Gateway shows PAID but no webhook ever arrived
    app.gateway.settle_order(&purchase.order_id, "txn_heal");

    let result = app
        .resume_order
        .handle(ResumeOrderCommand {
            order_id: purchase.order_id.clone(),
            user_id: app.user_id,
            customer: customer(),
        })
        .await
        .unwrap();

    assert!(matches!(result, ResumeOrderResult::AlreadyPaid));
    assert_eq!(app.ledger.invoice(&purchase.invoice_id).status, InvoiceStatus::Paid);
    let payment = app.ledger.payment_by_reference(&purchase.order_id).unwrap();
    assert_eq!(payment.status, PaymentStatus::Success);
    assert_eq!(payment.gateway_transaction_id.as_deref(), Some("txn_heal"));

    let subs = app.subscriptions.all();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].transaction_id.as_deref(), Some("txn_heal"));
}

#[tokio::test]
async fn resume_by_another_user_is_forbidden() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;

    let result = app
        .resume_order
        .handle(ResumeOrderCommand {
            order_id: purchase.order_id.clone(),
            user_id: UserId::new(),
            customer: customer(),
        })
        .await;

    assert!(matches!(result, Err(CommerceError::Forbidden)));
}

// =============================================================================
// Cancel
// =============================================================================

#[tokio::test]
async fn cancel_is_idempotent_and_respects_success() {
    let app = TestApp::new();
    let purchase = app.begin_purchase().await;

    let result = app
        .cancel_order
        .handle(CancelOrderCommand {
            order_id: purchase.order_id.clone(),
            user_id: app.user_id,
            reason: None,
        })
        .await
        .unwrap();
    assert_eq!(result, CancelOrderResult::Cancelled);
    assert_eq!(
        app.ledger.invoice(&purchase.invoice_id).status,
        InvoiceStatus::Cancelled
    );

    // Second cancel is a no-op
    let result = app
        .cancel_order
        .handle(CancelOrderCommand {
            order_id: purchase.order_id.clone(),
            user_id: app.user_id,
            reason: None,
        })
        .await
        .unwrap();
    assert_eq!(result, CancelOrderResult::AlreadyTerminal);

    // A settled order can never be cancelled
    let paid = app.begin_purchase().await;
    app.deliver_webhook(success_webhook(&paid.order_id, 9002))
        .await
        .unwrap();
    let result = app
        .cancel_order
        .handle(CancelOrderCommand {
            order_id: paid.order_id.clone(),
            user_id: app.user_id,
            reason: Some("changed my mind".to_string()),
        })
        .await;
    assert!(matches!(result, Err(CommerceError::InvalidState { .. })));
}
