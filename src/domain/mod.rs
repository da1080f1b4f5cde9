// 領域層：資料模型與對外協作者的介面

pub mod model;
pub mod ports;
