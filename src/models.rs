use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Submitted,
    CutoffPassed,
    InProduction,
    Ready,
    PickedUp,
    Canceled,
    NoShow,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Submitted => "submitted",
            OrderStatus::CutoffPassed => "cutoff_passed",
            OrderStatus::InProduction => "in_production",
            OrderStatus::Ready => "ready",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::Canceled => "canceled",
            OrderStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(OrderStatus::Submitted),
            "cutoff_passed" => Some(OrderStatus::CutoffPassed),
            "in_production" => Some(OrderStatus::InProduction),
            "ready" => Some(OrderStatus::Ready),
            "picked_up" => Some(OrderStatus::PickedUp),
            "canceled" => Some(OrderStatus::Canceled),
            "no_show" => Some(OrderStatus::NoShow),
            _ => None,
        }
    }

    /// Terminal states admit no further lifecycle transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::PickedUp | OrderStatus::Canceled | OrderStatus::NoShow
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Credited,
    Void,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Credited => "credited",
            PaymentStatus::Void => "void",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "refunded" => Some(PaymentStatus::Refunded),
            "credited" => Some(PaymentStatus::Credited),
            "void" => Some(PaymentStatus::Void),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    Draft,
    Completed,
}

impl SheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetStatus::Draft => "draft",
            SheetStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(SheetStatus::Draft),
            "completed" => Some(SheetStatus::Completed),
            _ => None,
        }
    }
}

/// Final disposition of a baked batch. Not a state machine: staff may move a
/// record freely between dispositions to correct outcomes after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Pending,
    PickedUp,
    Sold,
    Wasted,
    Personal,
    Gifted,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Pending => "pending",
            Disposition::PickedUp => "picked_up",
            Disposition::Sold => "sold",
            Disposition::Wasted => "wasted",
            Disposition::Personal => "personal",
            Disposition::Gifted => "gifted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Disposition::Pending),
            "picked_up" => Some(Disposition::PickedUp),
            "sold" => Some(Disposition::Sold),
            "wasted" => Some(Disposition::Wasted),
            "personal" => Some(Disposition::Personal),
            "gifted" => Some(Disposition::Gifted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSection {
    Base,
    FoldIn,
    Lamination,
}

impl RecipeSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeSection::Base => "base",
            RecipeSection::FoldIn => "fold_in",
            RecipeSection::Lamination => "lamination",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "base" => Some(RecipeSection::Base),
            "fold_in" => Some(RecipeSection::FoldIn),
            "lamination" => Some(RecipeSection::Lamination),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BakeSlot {
    pub id: i64,
    pub date: String,
    pub location_id: Option<i64>,
    pub location_name: Option<String>,
    pub total_capacity: i64,
    pub current_orders: i64,
    pub cutoff_at: String,
    pub is_open: bool,
    pub manually_closed_by: Option<i64>,
}

impl BakeSlot {
    pub fn remaining(&self) -> i64 {
        self.total_capacity - self.current_orders
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBakeSlot {
    pub date: String,
    pub location_id: Option<i64>,
    pub total_capacity: i64,
    pub cutoff_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub bake_slot_id: i64,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<String>,
    pub admin_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub flavor_id: i64,
    pub flavor_name: Option<String>,
    pub size: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total_price: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderItem {
    pub flavor_id: i64,
    pub size: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrder {
    pub customer_id: i64,
    pub bake_slot_id: i64,
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrepSheet {
    pub id: i64,
    pub bake_date: String,
    pub status: SheetStatus,
    pub notes: Option<String>,
    pub completed_at: Option<String>,
    pub completed_by: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrepSheetItem {
    pub id: i64,
    pub prep_sheet_id: i64,
    pub order_id: Option<i64>,
    pub flavor_id: i64,
    pub flavor_name: Option<String>,
    pub planned_quantity: i64,
    pub actual_quantity: Option<i64>,
}

impl PrepSheetItem {
    /// Extras are planned loaves not tied to any customer order.
    pub fn is_extra(&self) -> bool {
        self.order_id.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrepSheetWithItems {
    pub sheet: PrepSheet,
    pub items: Vec<PrepSheetItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProductionRecord {
    pub id: i64,
    pub prep_sheet_id: i64,
    pub order_id: Option<i64>,
    pub flavor_id: i64,
    pub flavor_name: Option<String>,
    pub quantity: i64,
    pub status: Disposition,
    pub sale_price: Option<f64>,
    pub notes: Option<String>,
    pub bake_date: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProductionRecord {
    pub status: Disposition,
    pub sale_price: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Flavor {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecipeIngredient {
    pub name: String,
    pub unit: String,
    /// Amount for a reference batch of one loaf.
    pub amount: f64,
    pub section: RecipeSection,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecipeStep {
    pub position: i64,
    pub instruction: String,
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Recipe {
    pub flavor_id: i64,
    pub ingredients: Vec<RecipeIngredient>,
    pub steps: Vec<RecipeStep>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ScaledIngredient {
    pub name: String,
    pub unit: String,
    pub amount: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FlavorBatch {
    pub flavor_id: i64,
    pub flavor_name: String,
    pub quantity: i64,
    pub base: Vec<ScaledIngredient>,
    pub fold_ins: Vec<ScaledIngredient>,
    pub laminations: Vec<ScaledIngredient>,
    pub steps: Vec<RecipeStep>,
    pub no_recipe: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PrepSheetData {
    pub flavors: Vec<FlavorBatch>,
    pub combined: Vec<ScaledIngredient>,
    pub total_loaves: i64,
}

/// Result of a successful capacity commit.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct Commit {
    pub remaining: i64,
}

/// Result of a capacity release. `underflow` reports that the decrement was
/// clamped at zero instead of going negative.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct Release {
    pub remaining: i64,
    pub underflow: bool,
}
